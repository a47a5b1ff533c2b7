//! Routing table and transition function for the orchestration graph.
//!
//! ```text
//! Classify ─┬─ factual | other ─▶ DirectAnswer ─▶ Done
//!           └─ debatable ──────▶ ProponentTurn ─▶ OpponentTurn ─▶ RoundCheck
//!                                     ▲                              │
//!                                     └──── round <= max_rounds ─────┤
//!                                                                    ▼
//!                                                                  Judge ─▶ Done
//! ```
//!
//! Step bodies never decide where to go next; they only mutate state.

use thiserror::Error;

use crate::core::types::{DebateState, Step, TopicType};

/// No edge leaves the current step for the observed state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no route for classification `{0}`")]
    Unclassified(String),
}

/// Routing policy applied after the classifier step.
pub fn route_classification(topic_type: &TopicType) -> Result<Step, RouteError> {
    match topic_type {
        TopicType::Factual | TopicType::Other => Ok(Step::DirectAnswer),
        TopicType::Debatable => Ok(Step::ProponentTurn),
        TopicType::Unclassified | TopicType::Unrecognized(_) => {
            Err(RouteError::Unclassified(topic_type.as_str().to_string()))
        }
    }
}

/// Loop predicate, evaluated after the round controller has incremented.
///
/// With `max_rounds = 3` the body runs for rounds 1..=3 and the judge sees
/// `round_number = 4`.
pub fn should_continue(state: &DebateState) -> bool {
    state.round_number() <= state.max_rounds()
}

/// Pure transition: the step to run after `current` has been applied.
pub fn next_step(current: Step, state: &DebateState) -> Result<Step, RouteError> {
    match current {
        Step::Classify => route_classification(state.topic_type()),
        Step::DirectAnswer => Ok(Step::Done),
        Step::ProponentTurn => Ok(Step::OpponentTurn),
        Step::OpponentTurn => Ok(Step::RoundCheck),
        Step::RoundCheck => {
            if should_continue(state) {
                Ok(Step::ProponentTurn)
            } else {
                Ok(Step::Judge)
            }
        }
        Step::Judge | Step::Done => Ok(Step::Done),
    }
}
