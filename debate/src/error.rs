//! Run-level failure types.

use thiserror::Error;

use crate::core::state_update::StateError;
use crate::core::types::{DebateState, Step};

/// Why a run stopped before reaching a terminal step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    /// `max_rounds` must be at least 1.
    #[error("max_rounds must be >= 1, got {0}")]
    InvalidMaxRounds(u32),

    /// The text-generation port could not produce a usable completion.
    #[error("generation failed during {step}: {message}")]
    GenerationFailure { step: Step, message: String },

    /// The classifier answered with a word that has no route.
    #[error("unclassified route: classifier returned `{0}`")]
    UnclassifiedRoute(String),

    /// A step was entered from a state that does not satisfy its preconditions.
    #[error("invalid state entering {step}: {source}")]
    InvalidState {
        step: Step,
        #[source]
        source: StateError,
    },

    /// A prompt template could not be rendered.
    #[error("prompt rendering failed during {step}: {message}")]
    PromptRender { step: Step, message: String },
}

/// A failed run: the failure kind plus the state as it was when the run stopped.
///
/// The state keeps every transcript entry appended before the failure.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct RunFailure {
    pub kind: FailureKind,
    pub state: Box<DebateState>,
}

impl RunFailure {
    pub fn new(kind: FailureKind, state: DebateState) -> Self {
        Self {
            kind,
            state: Box::new(state),
        }
    }

    /// Step that was running when the failure happened, when known.
    pub fn step(&self) -> Option<Step> {
        match &self.kind {
            FailureKind::GenerationFailure { step, .. }
            | FailureKind::InvalidState { step, .. }
            | FailureKind::PromptRender { step, .. } => Some(*step),
            FailureKind::UnclassifiedRoute(_) => Some(Step::Classify),
            FailureKind::InvalidMaxRounds(_) => None,
        }
    }
}
