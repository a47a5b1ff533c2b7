//! Topic-routed debate orchestrator.
//!
//! A topic is classified by a text-generation port, then either answered
//! directly or debated for a fixed number of Proponent/Opponent rounds and
//! closed by a judge's verdict. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (state transitions, routing,
//!   transcript format). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, prompt rendering, the
//!   command-backed generator, run artifacts).
//!
//! [`orchestrator`] coordinates core logic with the injected generator.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod orchestrator;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::types::{Behavior, DebateState, RunReport, TopicType};
pub use crate::error::{FailureKind, RunFailure};
pub use crate::orchestrator::{Orchestrator, OrchestratorConfig};
