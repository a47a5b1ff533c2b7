//! Debate configuration stored in `debate.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::DEFAULT_MAX_ROUNDS;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "debate.toml";

/// Debate configuration (TOML).
///
/// Intended to be edited by humans. Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebateConfig {
    /// Number of Proponent/Opponent rounds before the judge runs.
    pub max_rounds: u32,

    /// Wall-clock limit for a single generation call, in seconds.
    pub generation_timeout_secs: u64,

    /// Wall-clock limit for a whole run, in seconds. `0` disables it.
    pub run_timeout_secs: u64,

    /// Completions longer than this many bytes are rejected.
    pub output_limit_bytes: usize,

    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Command that reads a prompt on stdin and prints one completion.
    pub command: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: ["llm", "-m", "gemini-2.5-flash", "-o", "temperature", "0"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            generation_timeout_secs: 120,
            run_timeout_secs: 0,
            output_limit_bytes: 100_000,
            generator: GeneratorConfig::default(),
        }
    }
}

impl DebateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(anyhow!("max_rounds must be > 0"));
        }
        if self.generation_timeout_secs == 0 {
            return Err(anyhow!("generation_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.generator.command.is_empty() || self.generator.command[0].trim().is_empty() {
            return Err(anyhow!("generator.command must be a non-empty array"));
        }
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs))
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DebateConfig::default()`.
pub fn load_config(path: &Path) -> Result<DebateConfig> {
    if !path.exists() {
        let cfg = DebateConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DebateConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &DebateConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
