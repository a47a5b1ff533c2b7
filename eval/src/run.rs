//! Case execution.
//!
//! Runs cases through one shared orchestrator with a fixed number of worker
//! threads, scores each finished (or failed) run, and captures results.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use debate::io::config::DebateConfig;
use debate::io::generator::Generator;
use debate::{Orchestrator, RunReport};

use crate::case::CaseFile;
use crate::checks::{Judgment, judge};
use crate::config::apply_case_config;
use crate::outcome::{Outcome, classify_outcome};
use crate::results::{EvalMeta, write_results};

/// Scored result of running one case, persisted as `<case_id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseResult {
    pub case_id: String,
    pub topic: String,
    pub max_rounds: u32,
    pub outcome: Outcome,
    /// Final state, or the partial state when the run failed.
    pub report: RunReport,
    pub error: Option<String>,
    pub judgment: Judgment,
    pub duration_secs: f64,
}

/// Result of one `eval run` invocation.
#[derive(Debug)]
pub struct EvalRunOutcome {
    pub eval_run_id: String,
    pub results_dir: PathBuf,
    pub results: Vec<CaseResult>,
}

pub fn new_eval_run_id() -> String {
    format!("eval-{}", Utc::now().format("%Y%m%d_%H%M%S"))
}

/// Run `cases`, score them, and write results under `results_base`.
#[instrument(skip_all, fields(cases = cases.len(), concurrency = concurrency))]
pub fn run_eval<G: Generator + Sync>(
    orchestrator: &Orchestrator<G>,
    base: &DebateConfig,
    cases: &[CaseFile],
    concurrency: usize,
    results_base: &Path,
    dataset_hash: String,
) -> Result<EvalRunOutcome> {
    let eval_run_id = new_eval_run_id();
    let started_at = Utc::now();
    info!(eval_run_id, "eval run started");

    let results = run_cases(orchestrator, base, cases, concurrency)?;
    let finished_at = Utc::now();

    let meta = EvalMeta::new(
        &eval_run_id,
        dataset_hash,
        base,
        concurrency,
        started_at,
        finished_at,
        &results,
    );
    let results_dir = write_results(results_base, &meta, &results).context("write results")?;
    info!(results_dir = %results_dir.display(), "eval run complete");

    Ok(EvalRunOutcome {
        eval_run_id,
        results_dir,
        results,
    })
}

/// Run every case with at most `concurrency` in flight. Results keep case order.
pub fn run_cases<G: Generator + Sync>(
    orchestrator: &Orchestrator<G>,
    base: &DebateConfig,
    cases: &[CaseFile],
    concurrency: usize,
) -> Result<Vec<CaseResult>> {
    if concurrency == 0 {
        bail!("concurrency must be >= 1");
    }
    // Merge configs up front so a bad case fails before any generation call.
    let configs = cases
        .iter()
        .map(|case| {
            apply_case_config(base.clone(), &case.config)
                .with_context(|| format!("case {} config", case.case.id))
        })
        .collect::<Result<Vec<_>>>()?;

    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<CaseResult>>> = Mutex::new(vec![None; cases.len()]);
    let workers = concurrency.min(cases.len());

    std::thread::scope(|scope| {
        for worker in 0..workers {
            let (next, slots, configs) = (&next, &slots, &configs);
            scope.spawn(move || {
                loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(case) = cases.get(index) else {
                        break;
                    };
                    debug!(worker, case_id = %case.case.id, "case picked up");
                    let result = run_one(orchestrator, case, configs[index].max_rounds);
                    if let Ok(mut slots) = slots.lock() {
                        slots[index] = Some(result);
                    }
                }
            });
        }
    });

    let slots = slots
        .into_inner()
        .map_err(|_| anyhow::anyhow!("case result lock poisoned"))?;
    slots
        .into_iter()
        .zip(cases)
        .map(|(slot, case)| {
            slot.with_context(|| format!("case {} produced no result", case.case.id))
        })
        .collect()
}

#[instrument(skip_all, fields(case_id = %case.case.id, max_rounds = max_rounds))]
fn run_one<G: Generator>(
    orchestrator: &Orchestrator<G>,
    case: &CaseFile,
    max_rounds: u32,
) -> CaseResult {
    let started = Instant::now();
    let (report, error) = match orchestrator.run(&case.case.topic, max_rounds) {
        Ok(state) => (state.report(), None),
        Err(failure) => {
            warn!(error = %failure, "case run failed");
            (failure.state.report(), Some(failure.to_string()))
        }
    };
    let duration_secs = started.elapsed().as_secs_f64();

    let judgment = judge(&case.expect, &report, max_rounds);
    let outcome = classify_outcome(error.is_some(), &judgment.scores);
    info!(outcome = outcome.as_str(), duration_secs, "case finished");

    CaseResult {
        case_id: case.case.id.clone(),
        topic: case.case.topic.clone(),
        max_rounds,
        outcome,
        report,
        error,
        judgment,
        duration_secs,
    }
}
