use serde::{Deserialize, Serialize};

use crate::checks::Score;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    Error,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::Error => "error",
        }
    }
}

/// A failed run is an error regardless of scores; otherwise every applicable
/// score must be 1.0.
pub fn classify_outcome(run_failed: bool, scores: &[Score]) -> Outcome {
    if run_failed {
        Outcome::Error
    } else if scores.iter().all(Score::passed) {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}
