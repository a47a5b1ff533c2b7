//! Text-generation port.
//!
//! The [`Generator`] trait decouples the orchestrator from the actual model
//! backend. [`CommandGenerator`] pipes the prompt into a configured command
//! (for example the `llm` CLI); tests use scripted generators that return
//! predetermined completions without spawning processes.

use std::fmt;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::io::config::DebateConfig;
use crate::io::process::run_command_with_timeout;

/// Which step a prompt belongs to. Used for logging and scripted replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Classify,
    DirectAnswer,
    Proponent,
    Opponent,
    Judge,
}

impl PromptKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptKind::Classify => "classify",
            PromptKind::DirectAnswer => "direct_answer",
            PromptKind::Proponent => "proponent",
            PromptKind::Opponent => "opponent",
            PromptKind::Judge => "judge",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for one generation call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub kind: PromptKind,
    /// Prompt text fed to the model.
    pub prompt: String,
    /// Maximum time to wait for the completion. Implementations must honor it.
    pub timeout: Duration,
}

/// Abstraction over text-generation backends.
///
/// Implementations shared between concurrent runs must be `Sync`; each call
/// is independent and carries no conversation state.
pub trait Generator {
    /// Produce one completion for the request.
    fn generate(&self, request: &GenerateRequest) -> Result<String>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        (**self).generate(request)
    }
}

/// Generator that spawns a command, writes the prompt to its stdin, and
/// reads the completion from stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    argv: Vec<String>,
    output_limit_bytes: usize,
}

impl CommandGenerator {
    pub fn new(argv: Vec<String>, output_limit_bytes: usize) -> Result<Self> {
        if argv.is_empty() || argv[0].trim().is_empty() {
            return Err(anyhow!("generator command must be a non-empty array"));
        }
        Ok(Self {
            argv,
            output_limit_bytes,
        })
    }

    pub fn from_config(cfg: &DebateConfig) -> Result<Self> {
        Self::new(cfg.generator.command.clone(), cfg.output_limit_bytes)
    }
}

impl Generator for CommandGenerator {
    #[instrument(skip_all, fields(kind = %request.kind, timeout_secs = request.timeout.as_secs()))]
    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        info!(program = %self.argv[0], "starting generator command");

        let mut cmd = Command::new(&self.argv[0]);
        cmd.args(&self.argv[1..]);

        let output = run_command_with_timeout(
            cmd,
            Some(request.prompt.as_bytes()),
            request.timeout,
            self.output_limit_bytes,
        )
        .with_context(|| format!("run generator {}", self.argv[0]))?;

        if output.timed_out {
            warn!(
                timeout_secs = request.timeout.as_secs(),
                "generator timed out"
            );
            return Err(anyhow!("generator timed out after {:?}", request.timeout));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "generator failed");
            return Err(anyhow!(
                "generator failed with status {:?}: {}",
                output.status.code(),
                output.stderr_tail()
            ));
        }
        if output.stdout.is_truncated() {
            return Err(anyhow!(
                "completion exceeded {} bytes",
                self.output_limit_bytes
            ));
        }

        let text =
            String::from_utf8(output.stdout.bytes).context("completion is not valid UTF-8")?;
        debug!(bytes = text.len(), "generator completed");
        Ok(text.trim_end().to_string())
    }
}
