use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::outcome::Outcome;
use crate::results::{META_FILE, read_case_result, read_meta};
use crate::run::CaseResult;

#[derive(Debug, Default)]
pub struct ReportSummary {
    pub cases: usize,
    pub pass: usize,
    pub fail: usize,
    pub error: usize,
    pub avg_duration_secs: Option<f64>,
    /// Evaluator key -> (sum of scores, number of applicable scores).
    pub score_totals: BTreeMap<String, (f64, usize)>,
    /// Case ids that did not pass, with their outcome.
    pub failures: Vec<(String, Outcome)>,
}

impl ReportSummary {
    pub fn mean_score(&self, key: &str) -> Option<f64> {
        self.score_totals
            .get(key)
            .filter(|(_, count)| *count > 0)
            .map(|(sum, count)| sum / *count as f64)
    }
}

pub fn load_case_files(run_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(run_dir).with_context(|| format!("read {}", run_dir.display()))? {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
        if is_json && path.file_name().and_then(|n| n.to_str()) != Some(META_FILE) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Aggregate one eval run directory. Unreadable case files become warnings.
pub fn aggregate(run_dir: &Path) -> Result<(ReportSummary, Vec<String>)> {
    let mut summary = ReportSummary::default();
    let mut warnings = Vec::new();

    if let Err(err) = read_meta(run_dir) {
        warnings.push(format!("{META_FILE} invalid ({err:#})"));
    }

    for path in load_case_files(run_dir)? {
        let result = match read_case_result(&path) {
            Ok(result) => result,
            Err(err) => {
                warnings.push(format!("skip {}: {err:#}", path.display()));
                continue;
            }
        };
        record(&mut summary, &result);
        warnings.extend(
            result
                .judgment
                .warnings
                .iter()
                .map(|warning| format!("{}: {warning}", result.case_id)),
        );
    }

    Ok((summary, warnings))
}

fn record(summary: &mut ReportSummary, result: &CaseResult) {
    summary.cases += 1;
    match result.outcome {
        Outcome::Pass => summary.pass += 1,
        Outcome::Fail => summary.fail += 1,
        Outcome::Error => summary.error += 1,
    }
    if result.outcome != Outcome::Pass {
        summary
            .failures
            .push((result.case_id.clone(), result.outcome));
    }

    summary.avg_duration_secs = Some(match summary.avg_duration_secs {
        None => result.duration_secs,
        Some(avg) => {
            let total = avg * (summary.cases as f64 - 1.0) + result.duration_secs;
            total / summary.cases as f64
        }
    });

    for score in &result.judgment.scores {
        if let Some(value) = score.score {
            let entry = summary
                .score_totals
                .entry(score.key.clone())
                .or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
}
