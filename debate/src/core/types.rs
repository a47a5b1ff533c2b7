//! Shared deterministic types for the debate core.
//!
//! These types define stable contracts between the orchestrator, the CLI and
//! the evaluation harness. They must not depend on I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default number of debate rounds when the caller does not specify one.
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

/// Category assigned to a topic by the classifier step.
///
/// `Unrecognized` keeps the raw classifier word when it falls outside the
/// allowed set; routing refuses it instead of defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TopicType {
    #[default]
    Unclassified,
    Factual,
    Debatable,
    Other,
    Unrecognized(String),
}

impl TopicType {
    /// Normalize a raw classifier completion (trim + lowercase) and map it.
    pub fn from_classifier_output(raw: &str) -> Self {
        Self::from(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        match self {
            TopicType::Unclassified => "unclassified",
            TopicType::Factual => "factual",
            TopicType::Debatable => "debatable",
            TopicType::Other => "other",
            TopicType::Unrecognized(raw) => raw,
        }
    }

    pub fn is_classified(&self) -> bool {
        !matches!(self, TopicType::Unclassified)
    }
}

impl From<String> for TopicType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "unclassified" => TopicType::Unclassified,
            "factual" => TopicType::Factual,
            "debatable" => TopicType::Debatable,
            "other" => TopicType::Other,
            _ => TopicType::Unrecognized(value),
        }
    }
}

impl From<TopicType> for String {
    fn from(value: TopicType) -> Self {
        match value {
            TopicType::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side produced a debate turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Proponent,
    Opponent,
}

impl Speaker {
    /// Label as it appears in transcript entries (without the trailing colon).
    pub fn label(self) -> &'static str {
        match self {
            Speaker::Proponent => "Proponent",
            Speaker::Opponent => "Opponent",
        }
    }
}

/// Named states of the orchestration graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Classify,
    DirectAnswer,
    ProponentTurn,
    OpponentTurn,
    RoundCheck,
    Judge,
    Done,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Classify => "classify",
            Step::DirectAnswer => "direct_answer",
            Step::ProponentTurn => "proponent_turn",
            Step::OpponentTurn => "opponent_turn",
            Step::RoundCheck => "round_check",
            Step::Judge => "judge",
            Step::Done => "done",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Step::Done
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path a finished run took, derived from which output fields are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    DirectAnswer,
    FullDebate,
    Unknown,
}

impl Behavior {
    /// A non-empty answer wins over a non-empty transcript; neither is `Unknown`.
    pub fn from_outputs(final_response: Option<&str>, history: &[String]) -> Self {
        if final_response.is_some_and(|s| !s.is_empty()) {
            Behavior::DirectAnswer
        } else if !history.is_empty() {
            Behavior::FullDebate
        } else {
            Behavior::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Behavior::DirectAnswer => "direct_answer",
            Behavior::FullDebate => "full_debate",
            Behavior::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record threaded through every step of one run.
///
/// Fields are private: only the orchestrator mutates state, through the
/// checked transitions in [`crate::core::state_update`]. Callers receive the
/// finished state read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateState {
    pub(crate) topic: String,
    pub(crate) topic_type: TopicType,
    pub(crate) history: Vec<String>,
    pub(crate) proponent_last: Option<String>,
    pub(crate) opponent_last: Option<String>,
    pub(crate) round_number: u32,
    pub(crate) max_rounds: u32,
    pub(crate) final_response: Option<String>,
}

impl DebateState {
    /// Fresh state for one run: round 1, unclassified, empty transcript.
    pub fn new(topic: impl Into<String>, max_rounds: u32) -> Self {
        Self {
            topic: topic.into(),
            topic_type: TopicType::Unclassified,
            history: Vec::new(),
            proponent_last: None,
            opponent_last: None,
            round_number: 1,
            max_rounds,
            final_response: None,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn topic_type(&self) -> &TopicType {
        &self.topic_type
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn proponent_last(&self) -> Option<&str> {
        self.proponent_last.as_deref()
    }

    pub fn opponent_last(&self) -> Option<&str> {
        self.opponent_last.as_deref()
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn final_response(&self) -> Option<&str> {
        self.final_response.as_deref()
    }

    /// Which path the run took, judged only from populated output fields.
    pub fn behavior(&self) -> Behavior {
        Behavior::from_outputs(self.final_response.as_deref(), &self.history)
    }

    /// Project the externally visible run output.
    pub fn report(&self) -> RunReport {
        RunReport {
            topic_type: self.topic_type.clone(),
            final_response: self.final_response.clone(),
            history: self.history.clone(),
            round_number: self.round_number,
        }
    }
}

/// Output of the run entry point, as consumed by the evaluation harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub topic_type: TopicType,
    pub final_response: Option<String>,
    pub history: Vec<String>,
    pub round_number: u32,
}

impl RunReport {
    pub fn behavior(&self) -> Behavior {
        Behavior::from_outputs(self.final_response.as_deref(), &self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_output_is_trimmed_and_lowercased() {
        assert_eq!(
            TopicType::from_classifier_output("  Debatable\n"),
            TopicType::Debatable
        );
        assert_eq!(
            TopicType::from_classifier_output("FACTUAL"),
            TopicType::Factual
        );
    }

    #[test]
    fn unknown_classifier_word_is_kept_verbatim() {
        let parsed = TopicType::from_classifier_output(" Banana ");
        assert_eq!(parsed, TopicType::Unrecognized("banana".to_string()));
        assert_eq!(parsed.as_str(), "banana");
    }

    #[test]
    fn topic_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&TopicType::Other).expect("serialize");
        assert_eq!(json, "\"other\"");
        let back: TopicType = serde_json::from_str("\"banana\"").expect("deserialize");
        assert_eq!(back, TopicType::Unrecognized("banana".to_string()));
    }

    #[test]
    fn new_state_starts_at_round_one_unclassified() {
        let state = DebateState::new("topic", DEFAULT_MAX_ROUNDS);
        assert_eq!(state.round_number(), 1);
        assert_eq!(state.max_rounds(), 3);
        assert_eq!(state.topic_type(), &TopicType::Unclassified);
        assert!(state.history().is_empty());
        assert!(state.final_response().is_none());
        assert_eq!(state.behavior(), Behavior::Unknown);
    }
}
