//! Debate configuration merging.
//!
//! Applies case-specific overrides to the base debate configuration.

use anyhow::Result;
use debate::io::config::DebateConfig;

use crate::case::CaseConfig;

/// Apply case configuration overrides to the base debate config.
pub fn apply_case_config(mut base: DebateConfig, overrides: &CaseConfig) -> Result<DebateConfig> {
    if let Some(max_rounds) = overrides.max_rounds {
        base.max_rounds = max_rounds;
    }
    base.validate()?;
    Ok(base)
}
