//! Drives one topic through the orchestration graph.
//!
//! The orchestrator owns the [`DebateState`] for the duration of a run,
//! applies one step at a time, and asks [`next_step`] where to go next.
//! Every step is strictly sequential: each prompt depends on the output of
//! the step before it.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::core::budget::call_timeout;
use crate::core::routing::{RouteError, next_step};
use crate::core::state_update::{
    StateError, advance_round, check_entry, record_classification, record_direct_answer,
    record_turn, record_verdict,
};
use crate::core::types::{DebateState, Speaker, Step};
use crate::error::{FailureKind, RunFailure};
use crate::io::config::DebateConfig;
use crate::io::generator::{GenerateRequest, Generator, PromptKind};
use crate::io::prompt::PromptBuilder;

/// Limits applied to every run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Deadline for a single generation call.
    pub generation_timeout: Duration,
    /// Deadline for the whole run; `None` leaves only the per-call limit.
    pub run_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(120),
            run_timeout: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_config(cfg: &DebateConfig) -> Self {
        Self {
            generation_timeout: cfg.generation_timeout(),
            run_timeout: cfg.run_timeout(),
        }
    }
}

/// Classify-then-route orchestrator over an injected text-generation port.
///
/// `run` takes `&self` and keeps all run state local, so one orchestrator can
/// serve concurrent runs when `G: Sync`.
pub struct Orchestrator<G> {
    generator: G,
    prompts: PromptBuilder,
    config: OrchestratorConfig,
}

impl<G: Generator> Orchestrator<G> {
    pub fn new(generator: G, config: OrchestratorConfig) -> Self {
        Self {
            generator,
            prompts: PromptBuilder::new(),
            config,
        }
    }

    /// Run `topic` to completion and return the final state.
    pub fn run(&self, topic: &str, max_rounds: u32) -> Result<DebateState, RunFailure> {
        self.run_observed(topic, max_rounds, |_, _| {})
    }

    /// Like [`Orchestrator::run`], calling `on_step` after each applied step.
    #[instrument(skip_all, fields(max_rounds = max_rounds))]
    pub fn run_observed<F: FnMut(Step, &DebateState)>(
        &self,
        topic: &str,
        max_rounds: u32,
        mut on_step: F,
    ) -> Result<DebateState, RunFailure> {
        let mut state = DebateState::new(topic, max_rounds);
        if max_rounds == 0 {
            return Err(RunFailure::new(FailureKind::InvalidMaxRounds(max_rounds), state));
        }

        let deadline = self.config.run_timeout.map(|limit| Instant::now() + limit);
        info!(topic_len = topic.len(), "run started");

        let mut step = Step::Classify;
        while !step.is_terminal() {
            if let Err(kind) = self.apply(step, &mut state, deadline) {
                warn!(step = %step, error = %kind, "run failed");
                return Err(RunFailure::new(kind, state));
            }
            on_step(step, &state);

            step = match next_step(step, &state) {
                Ok(next) => next,
                Err(RouteError::Unclassified(raw)) => {
                    warn!(topic_type = %raw, "no route for classification");
                    return Err(RunFailure::new(FailureKind::UnclassifiedRoute(raw), state));
                }
            };
            debug!(next = %step, round = state.round_number(), "transition");
        }

        info!(
            topic_type = %state.topic_type(),
            round_number = state.round_number(),
            entries = state.history().len(),
            "run finished"
        );
        Ok(state)
    }

    /// Apply the body of `step` to `state`. Never decides the next step.
    fn apply(
        &self,
        step: Step,
        state: &mut DebateState,
        deadline: Option<Instant>,
    ) -> Result<(), FailureKind> {
        let invalid = |source: StateError| FailureKind::InvalidState { step, source };
        check_entry(step, state).map_err(invalid)?;

        match step {
            Step::Classify => {
                let raw = self.generate(PromptKind::Classify, step, state, deadline)?;
                record_classification(state, &raw).map_err(invalid)?;
                debug!(topic_type = %state.topic_type(), "classified");
            }
            Step::DirectAnswer => {
                let answer = self.generate(PromptKind::DirectAnswer, step, state, deadline)?;
                record_direct_answer(state, answer).map_err(invalid)?;
            }
            Step::ProponentTurn => {
                let text = self.generate(PromptKind::Proponent, step, state, deadline)?;
                record_turn(state, Speaker::Proponent, text).map_err(invalid)?;
            }
            Step::OpponentTurn => {
                let text = self.generate(PromptKind::Opponent, step, state, deadline)?;
                record_turn(state, Speaker::Opponent, text).map_err(invalid)?;
            }
            Step::RoundCheck => advance_round(state),
            Step::Judge => {
                let verdict = self.generate(PromptKind::Judge, step, state, deadline)?;
                record_verdict(state, &verdict).map_err(invalid)?;
            }
            Step::Done => {}
        }
        Ok(())
    }

    fn generate(
        &self,
        kind: PromptKind,
        step: Step,
        state: &DebateState,
        deadline: Option<Instant>,
    ) -> Result<String, FailureKind> {
        let failure = |message: String| FailureKind::GenerationFailure { step, message };

        let prompt = self
            .prompts
            .render(kind, state)
            .map_err(|err| FailureKind::PromptRender {
                step,
                message: format!("{err:#}"),
            })?;
        let timeout = call_timeout(self.config.generation_timeout, deadline)
            .map_err(|err| failure(err.to_string()))?;

        debug!(kind = %kind, round = state.round_number(), "calling generator");
        let text = self
            .generator
            .generate(&GenerateRequest {
                kind,
                prompt,
                timeout,
            })
            .map_err(|err| failure(format!("{err:#}")))?;

        // A blank classification is routed like any other unknown label.
        if kind != PromptKind::Classify && text.trim().is_empty() {
            return Err(failure("empty completion".to_string()));
        }
        Ok(text)
    }
}
