//! Checked state transitions applied after each step.
//!
//! Each function validates the optional-field population it depends on
//! before mutating, so a mis-sequenced step is reported instead of silently
//! producing a broken transcript.

use thiserror::Error;

use crate::core::transcript::{turn_entry, verdict_entry};
use crate::core::types::{DebateState, Speaker, Step, TopicType};

/// A transition was attempted from a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("topic already classified as `{0}`")]
    AlreadyClassified(String),
    #[error("topic is not classified yet")]
    NotClassified,
    #[error("final response already set")]
    FinalResponseSet,
    #[error("direct answer on a run with debate history")]
    HistoryNotEmpty,
    #[error("opponent turn without a proponent utterance in round {0}")]
    MissingProponentTurn(u32),
    #[error("verdict requested with an empty transcript")]
    EmptyTranscript,
    #[error("round {round} exceeds max rounds {max_rounds}")]
    RoundOutOfRange { round: u32, max_rounds: u32 },
}

/// Preconditions for entering `step`, checked before any generation call.
pub fn check_entry(step: Step, state: &DebateState) -> Result<(), StateError> {
    match step {
        Step::DirectAnswer => {
            if !state.topic_type.is_classified() {
                return Err(StateError::NotClassified);
            }
            if state.final_response.is_some() {
                return Err(StateError::FinalResponseSet);
            }
            if !state.history.is_empty() {
                return Err(StateError::HistoryNotEmpty);
            }
        }
        Step::ProponentTurn => check_turn(state, Speaker::Proponent)?,
        Step::OpponentTurn => check_turn(state, Speaker::Opponent)?,
        Step::Judge => {
            if state.final_response.is_some() {
                return Err(StateError::FinalResponseSet);
            }
            if state.history.is_empty() {
                return Err(StateError::EmptyTranscript);
            }
        }
        Step::Classify | Step::RoundCheck | Step::Done => {}
    }
    Ok(())
}

fn check_turn(state: &DebateState, speaker: Speaker) -> Result<(), StateError> {
    if state.final_response.is_some() {
        return Err(StateError::FinalResponseSet);
    }
    if state.round_number > state.max_rounds {
        return Err(StateError::RoundOutOfRange {
            round: state.round_number,
            max_rounds: state.max_rounds,
        });
    }
    if speaker == Speaker::Opponent && !proponent_spoke_this_round(state) {
        return Err(StateError::MissingProponentTurn(state.round_number));
    }
    Ok(())
}

/// True when the latest entry is this round's Proponent turn.
fn proponent_spoke_this_round(state: &DebateState) -> bool {
    let prefix = turn_entry(state.round_number, Speaker::Proponent, "");
    state.proponent_last.is_some()
        && state
            .history
            .last()
            .is_some_and(|entry| entry.starts_with(&prefix))
}

/// Store the normalized classifier output. Allowed exactly once.
pub fn record_classification(state: &mut DebateState, raw: &str) -> Result<(), StateError> {
    if state.topic_type.is_classified() {
        return Err(StateError::AlreadyClassified(
            state.topic_type.as_str().to_string(),
        ));
    }
    state.topic_type = TopicType::from_classifier_output(raw);
    Ok(())
}

/// Store the terminal answer for the direct-answer path.
pub fn record_direct_answer(state: &mut DebateState, answer: String) -> Result<(), StateError> {
    check_entry(Step::DirectAnswer, state)?;
    state.final_response = Some(answer);
    Ok(())
}

/// Record a debate turn for the current round.
pub fn record_turn(
    state: &mut DebateState,
    speaker: Speaker,
    text: String,
) -> Result<(), StateError> {
    check_turn(state, speaker)?;
    state
        .history
        .push(turn_entry(state.round_number, speaker, &text));
    match speaker {
        Speaker::Proponent => state.proponent_last = Some(text),
        Speaker::Opponent => state.opponent_last = Some(text),
    }
    Ok(())
}

/// Advance the round counter by exactly one.
pub fn advance_round(state: &mut DebateState) {
    state.round_number += 1;
}

/// Append the judge's verdict under the fixed marker.
pub fn record_verdict(state: &mut DebateState, verdict: &str) -> Result<(), StateError> {
    check_entry(Step::Judge, state)?;
    state.history.push(verdict_entry(verdict));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript::JUDGE_MARKER;

    fn debatable_state(max_rounds: u32) -> DebateState {
        let mut state = DebateState::new("Is tea better than coffee?", max_rounds);
        record_classification(&mut state, "debatable").expect("classify");
        state
    }

    #[test]
    fn classification_is_set_once() {
        let mut state = DebateState::new("t", 3);
        record_classification(&mut state, " Factual ").expect("first");
        assert_eq!(state.topic_type(), &TopicType::Factual);
        let err = record_classification(&mut state, "other").unwrap_err();
        assert_eq!(err, StateError::AlreadyClassified("factual".to_string()));
    }

    #[test]
    fn direct_answer_requires_classification() {
        let mut state = DebateState::new("t", 3);
        let err = record_direct_answer(&mut state, "Paris".to_string()).unwrap_err();
        assert_eq!(err, StateError::NotClassified);
    }

    #[test]
    fn turns_are_labeled_with_current_round() {
        let mut state = debatable_state(2);
        record_turn(&mut state, Speaker::Proponent, "yes".to_string()).expect("pro");
        record_turn(&mut state, Speaker::Opponent, "no".to_string()).expect("opp");
        advance_round(&mut state);
        record_turn(&mut state, Speaker::Proponent, "still yes".to_string()).expect("pro 2");

        assert_eq!(
            state.history(),
            [
                "[Round 1] Proponent: yes",
                "[Round 1] Opponent: no",
                "[Round 2] Proponent: still yes",
            ]
        );
        assert_eq!(state.proponent_last(), Some("still yes"));
        assert_eq!(state.opponent_last(), Some("no"));
    }

    #[test]
    fn opponent_requires_proponent_utterance() {
        let mut state = debatable_state(3);
        let err = record_turn(&mut state, Speaker::Opponent, "no".to_string()).unwrap_err();
        assert_eq!(err, StateError::MissingProponentTurn(1));
        assert!(state.history().is_empty());
    }

    #[test]
    fn opponent_cannot_reuse_previous_round_proponent() {
        let mut state = debatable_state(3);
        record_turn(&mut state, Speaker::Proponent, "yes".to_string()).expect("pro");
        record_turn(&mut state, Speaker::Opponent, "no".to_string()).expect("opp");
        advance_round(&mut state);
        assert_eq!(
            check_entry(Step::OpponentTurn, &state),
            Err(StateError::MissingProponentTurn(2))
        );
        assert_eq!(check_entry(Step::ProponentTurn, &state), Ok(()));
    }

    #[test]
    fn direct_answer_entry_rejects_debate_history() {
        let mut state = debatable_state(3);
        record_turn(&mut state, Speaker::Proponent, "yes".to_string()).expect("pro");
        assert_eq!(
            check_entry(Step::DirectAnswer, &state),
            Err(StateError::HistoryNotEmpty)
        );
    }

    #[test]
    fn turns_past_max_rounds_are_rejected() {
        let mut state = debatable_state(1);
        advance_round(&mut state);
        let err = record_turn(&mut state, Speaker::Proponent, "x".to_string()).unwrap_err();
        assert_eq!(
            err,
            StateError::RoundOutOfRange {
                round: 2,
                max_rounds: 1
            }
        );
    }

    #[test]
    fn verdict_appends_marked_entry() {
        let mut state = debatable_state(1);
        assert_eq!(
            record_verdict(&mut state, "tie"),
            Err(StateError::EmptyTranscript)
        );
        record_turn(&mut state, Speaker::Proponent, "a".to_string()).expect("pro");
        record_turn(&mut state, Speaker::Opponent, "b".to_string()).expect("opp");
        record_verdict(&mut state, "tie").expect("verdict");
        let last = state.history().last().expect("verdict entry");
        assert!(last.contains(JUDGE_MARKER));
        assert!(last.ends_with("tie"));
    }
}
