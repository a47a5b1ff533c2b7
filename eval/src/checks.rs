//! Structural evaluators over a run report.
//!
//! Every evaluator is deterministic: it looks at which output fields are
//! populated and at transcript labels, never at the generated text itself.

use serde::{Deserialize, Serialize};

use debate::core::transcript::summarize;
use debate::{Behavior, RunReport};

use crate::case::Expectation;

pub const CLASSIFICATION_ACCURACY: &str = "classification_accuracy";
pub const BEHAVIOR_CORRECTNESS: &str = "behavior_correctness";
pub const DEBATE_COMPLETENESS: &str = "debate_completeness";

const PROPONENT_WEIGHT: f64 = 0.3;
const OPPONENT_WEIGHT: f64 = 0.3;
const VERDICT_WEIGHT: f64 = 0.4;

/// One evaluator result. `score` is `None` when the evaluator does not apply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Score {
    pub key: String,
    pub score: Option<f64>,
    pub comment: String,
}

impl Score {
    fn new(key: &str, score: Option<f64>, comment: String) -> Self {
        Self {
            key: key.to_string(),
            score,
            comment,
        }
    }

    pub fn passed(&self) -> bool {
        self.score.is_none_or(|score| score >= 1.0)
    }
}

/// Scores plus non-fatal findings for one case.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Judgment {
    pub scores: Vec<Score>,
    pub warnings: Vec<String>,
}

/// Run every evaluator against `report`.
pub fn judge(expect: &Expectation, report: &RunReport, max_rounds: u32) -> Judgment {
    let mut warnings = Vec::new();
    let scores = vec![
        classification_accuracy(expect, report),
        behavior_correctness(expect, report),
        debate_completeness(expect, report, max_rounds, &mut warnings),
    ];
    Judgment { scores, warnings }
}

pub fn classification_accuracy(expect: &Expectation, report: &RunReport) -> Score {
    let actual = report.topic_type.as_str();
    let score = if actual == expect.topic_type { 1.0 } else { 0.0 };
    Score::new(
        CLASSIFICATION_ACCURACY,
        Some(score),
        format!("Expected: {}, Got: {}", expect.topic_type, actual),
    )
}

pub fn behavior_correctness(expect: &Expectation, report: &RunReport) -> Score {
    let actual = report.behavior();
    let score = if actual == expect.behavior { 1.0 } else { 0.0 };
    Score::new(
        BEHAVIOR_CORRECTNESS,
        Some(score),
        format!("Expected: {}, Got: {}", expect.behavior, actual),
    )
}

/// Weighted check that both sides argued every round and the judge spoke.
pub fn debate_completeness(
    expect: &Expectation,
    report: &RunReport,
    max_rounds: u32,
    warnings: &mut Vec<String>,
) -> Score {
    if expect.behavior != Behavior::FullDebate {
        return Score::new(
            DEBATE_COMPLETENESS,
            None,
            "N/A - not a debate".to_string(),
        );
    }

    let summary = summarize(&report.history);
    warnings.extend(summary.malformed.iter().map(ToString::to_string));

    let rounds = max_rounds as usize;
    let mut score = 0.0;
    let mut comments = Vec::new();

    if summary.proponent_turns >= rounds {
        score += PROPONENT_WEIGHT;
        comments.push(format!("ok: Proponent argued {rounds} rounds"));
    } else {
        comments.push(format!(
            "missing: Proponent only argued {} rounds",
            summary.proponent_turns
        ));
    }

    if summary.opponent_turns >= rounds {
        score += OPPONENT_WEIGHT;
        comments.push(format!("ok: Opponent argued {rounds} rounds"));
    } else {
        comments.push(format!(
            "missing: Opponent only argued {} rounds",
            summary.opponent_turns
        ));
    }

    if summary.has_verdict() {
        score += VERDICT_WEIGHT;
        comments.push("ok: Judge provided verdict".to_string());
    } else {
        comments.push("missing: No judge verdict found".to_string());
    }

    Score::new(DEBATE_COMPLETENESS, Some(score), comments.join(" | "))
}
