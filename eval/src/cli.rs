//! CLI command implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use debate::io::config::load_config;
use debate::io::generator::CommandGenerator;
use debate::{Orchestrator, OrchestratorConfig};

use crate::case::{case_paths, discover_cases, validate_case_id};
use crate::checks::{BEHAVIOR_CORRECTNESS, CLASSIFICATION_ACCURACY, DEBATE_COMPLETENESS};
use crate::report::aggregate;
use crate::results::dataset_sha256;
use crate::run::run_eval;

fn cases_dir(repo_root: &Path) -> PathBuf {
    repo_root.join("eval").join("cases")
}

fn results_base(repo_root: &Path) -> PathBuf {
    repo_root.join("eval").join("results")
}

/// List all available cases.
pub fn list_cases(repo_root: &Path) -> Result<()> {
    for case in discover_cases(&cases_dir(repo_root))? {
        println!(
            "{} [{} / {}] {}",
            case.case.id, case.expect.topic_type, case.expect.behavior, case.case.topic
        );
    }
    Ok(())
}

/// Run every case (or one case by id) against the configured generator.
pub fn run_cases(
    repo_root: &Path,
    case_id: Option<&str>,
    concurrency: usize,
    config_path: &Path,
) -> Result<()> {
    let dir = cases_dir(repo_root);
    let mut cases = discover_cases(&dir)?;
    if let Some(case_id) = case_id {
        validate_case_id(case_id)?;
        cases.retain(|case| case.case.id == case_id);
        if cases.is_empty() {
            bail!("case {} not found in {}", case_id, dir.display());
        }
    }
    if cases.is_empty() {
        bail!("no cases found in {}", dir.display());
    }
    let dataset_hash = dataset_sha256(&case_paths(&dir)?).context("hash dataset")?;

    let cfg = load_config(config_path)?;
    debug!(cases = cases.len(), concurrency, "cases loaded");
    let generator = CommandGenerator::from_config(&cfg)?;
    let orchestrator = Orchestrator::new(generator, OrchestratorConfig::from_config(&cfg));

    info!(cases = cases.len(), concurrency, "starting eval");
    let outcome = run_eval(
        &orchestrator,
        &cfg,
        &cases,
        concurrency,
        &results_base(repo_root),
        dataset_hash,
    )?;
    for result in &outcome.results {
        println!(
            "case: id={} outcome={} round_number={} entries={}",
            result.case_id,
            result.outcome.as_str(),
            result.report.round_number,
            result.report.history.len()
        );
    }
    println!(
        "run: eval_run_id={} results={}",
        outcome.eval_run_id,
        outcome.results_dir.display()
    );
    Ok(())
}

/// Show aggregated results for an eval run.
pub fn report_run(repo_root: &Path, eval_run_id: &str) -> Result<()> {
    let run_dir = results_base(repo_root).join(eval_run_id);
    if !run_dir.is_dir() {
        bail!("no results for {} at {}", eval_run_id, run_dir.display());
    }
    let (summary, warnings) = aggregate(&run_dir)?;
    println!("report: eval_run_id={} cases={}", eval_run_id, summary.cases);
    println!(
        "report: pass={} fail={} error={}",
        summary.pass, summary.fail, summary.error
    );
    if let Some(avg) = summary.avg_duration_secs {
        println!("report: avg_duration_secs={:.2}", avg);
    }
    for key in [
        CLASSIFICATION_ACCURACY,
        BEHAVIOR_CORRECTNESS,
        DEBATE_COMPLETENESS,
    ] {
        if let Some(mean) = summary.mean_score(key) {
            println!("report: mean {} {:.2}", key, mean);
        }
    }
    for (case_id, outcome) in &summary.failures {
        println!("report: {} {}", outcome.as_str(), case_id);
    }
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

/// Remove all eval results.
pub fn clean_results(repo_root: &Path) -> Result<()> {
    let results = results_base(repo_root);
    if results.exists() {
        std::fs::remove_dir_all(&results)
            .with_context(|| format!("remove {}", results.display()))?;
    }
    println!("clean: results={}", results.display());
    Ok(())
}
