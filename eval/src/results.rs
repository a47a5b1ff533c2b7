//! Result persistence.
//!
//! One directory per eval run: `meta.json` plus one `<case_id>.json` per case.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use debate::io::config::DebateConfig;

use crate::outcome::Outcome;
use crate::run::CaseResult;

pub const META_FILE: &str = "meta.json";

/// Metadata for an eval run, persisted to `meta.json`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EvalMeta {
    pub eval_run_id: String,
    /// SHA-256 over the case files, for reproducibility tracking.
    pub dataset_hash: String,
    pub generator_command: Vec<String>,
    pub default_max_rounds: u32,
    pub concurrency: usize,
    pub case_ids: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub duration_secs: f64,
    pub pass: usize,
    pub fail: usize,
    pub error: usize,
}

impl EvalMeta {
    pub fn new(
        eval_run_id: &str,
        dataset_hash: String,
        cfg: &DebateConfig,
        concurrency: usize,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        results: &[CaseResult],
    ) -> Self {
        let count = |outcome: Outcome| results.iter().filter(|r| r.outcome == outcome).count();
        let duration = finished_at - started_at;
        Self {
            eval_run_id: eval_run_id.to_string(),
            dataset_hash,
            generator_command: cfg.generator.command.clone(),
            default_max_rounds: cfg.max_rounds,
            concurrency,
            case_ids: results.iter().map(|r| r.case_id.clone()).collect(),
            start_time: started_at.to_rfc3339(),
            end_time: finished_at.to_rfc3339(),
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            pass: count(Outcome::Pass),
            fail: count(Outcome::Fail),
            error: count(Outcome::Error),
        }
    }
}

pub fn results_dir(base_dir: &Path, eval_run_id: &str) -> PathBuf {
    base_dir.join(eval_run_id)
}

/// Write `meta.json` and every case result; returns the run directory.
#[instrument(skip_all, fields(eval_run_id = %meta.eval_run_id))]
pub fn write_results(base_dir: &Path, meta: &EvalMeta, results: &[CaseResult]) -> Result<PathBuf> {
    let dir = results_dir(base_dir, &meta.eval_run_id);
    fs::create_dir_all(&dir).with_context(|| format!("create results dir {}", dir.display()))?;
    for result in results {
        write_json(&dir.join(format!("{}.json", result.case_id)), result)?;
    }
    write_json(&dir.join(META_FILE), meta)?;
    debug!(results_dir = %dir.display(), cases = results.len(), "results written");
    Ok(dir)
}

pub fn read_meta(dir: &Path) -> Result<EvalMeta> {
    let path = dir.join(META_FILE);
    let contents =
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

pub fn read_case_result(path: &Path) -> Result<CaseResult> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    fs::write(path, format!("{contents}\n")).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// SHA-256 over the contents of `paths`, in the given order.
pub fn dataset_sha256(paths: &[PathBuf]) -> Result<String> {
    let mut hasher = Sha256::new();
    for path in paths {
        let contents = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        hasher.update(&contents);
    }
    Ok(hex::encode(hasher.finalize()))
}
