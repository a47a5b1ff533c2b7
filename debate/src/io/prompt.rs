//! Prompt rendering for each orchestration step.

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, context};
use tracing::debug;

use crate::core::transcript::join_transcript;
use crate::core::types::DebateState;
use crate::io::generator::PromptKind;

const CLASSIFIER_TEMPLATE: &str = include_str!("prompts/classifier.md");
const DIRECT_ANSWER_TEMPLATE: &str = include_str!("prompts/direct_answer.md");
const PROPONENT_TEMPLATE: &str = include_str!("prompts/proponent.md");
const OPPONENT_TEMPLATE: &str = include_str!("prompts/opponent.md");
const JUDGE_TEMPLATE: &str = include_str!("prompts/judge.md");

/// Template engine wrapper around minijinja.
///
/// Templates are embedded at compile time; construction only fails if one of
/// them is syntactically broken, which the unit tests guard against.
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        let mut env = Environment::new();
        for (kind, source) in [
            (PromptKind::Classify, CLASSIFIER_TEMPLATE),
            (PromptKind::DirectAnswer, DIRECT_ANSWER_TEMPLATE),
            (PromptKind::Proponent, PROPONENT_TEMPLATE),
            (PromptKind::Opponent, OPPONENT_TEMPLATE),
            (PromptKind::Judge, JUDGE_TEMPLATE),
        ] {
            env.add_template(kind.as_str(), source)
                .expect("embedded prompt template should be valid");
        }
        Self { env }
    }

    /// Render the prompt for `kind` from the current state.
    pub fn render(&self, kind: PromptKind, state: &DebateState) -> Result<String> {
        let template = self.env.get_template(kind.as_str())?;
        let rendered = match kind {
            PromptKind::Classify | PromptKind::DirectAnswer => template.render(context! {
                topic => state.topic(),
            }),
            PromptKind::Proponent => template.render(context! {
                topic => state.topic(),
                round => state.round_number(),
                opponent_last => state.opponent_last(),
            }),
            PromptKind::Opponent => {
                let proponent_last = state
                    .proponent_last()
                    .ok_or_else(|| anyhow!("opponent prompt needs a proponent utterance"))?;
                template.render(context! {
                    topic => state.topic(),
                    round => state.round_number(),
                    proponent_last => proponent_last,
                })
            }
            PromptKind::Judge => template.render(context! {
                topic => state.topic(),
                round => state.round_number(),
                transcript => join_transcript(state.history()),
            }),
        }
        .with_context(|| format!("render {kind} prompt"))?;
        debug!(kind = %kind, bytes = rendered.len(), "rendered prompt");
        Ok(rendered)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state_update::{advance_round, record_classification, record_turn};
    use crate::core::types::Speaker;

    fn debate_state() -> DebateState {
        let mut state = DebateState::new("Is pineapple an acceptable pizza topping?", 3);
        record_classification(&mut state, "debatable").expect("classify");
        state
    }

    #[test]
    fn classifier_prompt_lists_allowed_words_and_topic() {
        let prompt = PromptBuilder::new()
            .render(PromptKind::Classify, &debate_state())
            .expect("render");
        assert!(prompt.contains("factual, debatable, or other"));
        assert!(prompt.contains("\"Is pineapple an acceptable pizza topping?\""));
    }

    #[test]
    fn first_proponent_prompt_marks_missing_opponent() {
        let prompt = PromptBuilder::new()
            .render(PromptKind::Proponent, &debate_state())
            .expect("render");
        assert!(prompt.contains("Round 1"));
        assert!(prompt.contains("Nothing yet - this is the first round."));
    }

    #[test]
    fn later_proponent_prompt_quotes_opponent() {
        let mut state = debate_state();
        record_turn(&mut state, Speaker::Proponent, "Sweet and salty.".to_string()).expect("pro");
        record_turn(&mut state, Speaker::Opponent, "Fruit is wrong.".to_string()).expect("opp");
        advance_round(&mut state);
        let prompt = PromptBuilder::new()
            .render(PromptKind::Proponent, &state)
            .expect("render");
        assert!(prompt.contains("Round 2"));
        assert!(prompt.contains("Fruit is wrong."));
        assert!(!prompt.contains("Nothing yet"));
    }

    #[test]
    fn opponent_prompt_requires_proponent_text() {
        let builder = PromptBuilder::new();
        assert!(builder.render(PromptKind::Opponent, &debate_state()).is_err());

        let mut state = debate_state();
        record_turn(&mut state, Speaker::Proponent, "Sweet and salty.".to_string()).expect("pro");
        let prompt = builder.render(PromptKind::Opponent, &state).expect("render");
        assert!(prompt.contains("AGAINST"));
        assert!(prompt.contains("Sweet and salty."));
    }

    #[test]
    fn judge_prompt_carries_round_number_and_transcript() {
        let mut state = debate_state();
        record_turn(&mut state, Speaker::Proponent, "yes".to_string()).expect("pro");
        record_turn(&mut state, Speaker::Opponent, "no".to_string()).expect("opp");
        advance_round(&mut state);
        let prompt = PromptBuilder::new()
            .render(PromptKind::Judge, &state)
            .expect("render");
        assert!(prompt.contains("The debate lasted 2 rounds."));
        assert!(prompt.contains("[Round 1] Proponent: yes\n\n[Round 1] Opponent: no"));
        assert!(prompt.contains("final verdict"));
    }
}
