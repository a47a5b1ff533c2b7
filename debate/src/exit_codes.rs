//! Stable exit codes for the `debate` CLI.

use crate::error::FailureKind;

/// Run reached a terminal step.
pub const OK: i32 = 0;
/// Invalid input, config, or I/O error.
pub const INVALID: i32 = 1;
/// The text-generation port failed or timed out.
pub const GENERATION_FAILED: i32 = 2;
/// The classifier returned a word with no route.
pub const UNCLASSIFIED: i32 = 3;
/// A step was entered from a state that violates its preconditions.
pub const INVALID_STATE: i32 = 4;

/// Exit code reported for a failed run.
pub fn for_failure(kind: &FailureKind) -> i32 {
    match kind {
        FailureKind::InvalidMaxRounds(_) => INVALID,
        FailureKind::GenerationFailure { .. } => GENERATION_FAILED,
        FailureKind::UnclassifiedRoute(_) => UNCLASSIFIED,
        FailureKind::InvalidState { .. } | FailureKind::PromptRender { .. } => INVALID_STATE,
    }
}
