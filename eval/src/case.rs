//! Case file parsing and validation.
//!
//! Cases are TOML files naming a topic and the route the orchestrator is
//! expected to take for it. See `eval/cases/` for examples.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use debate::Behavior;

/// A parsed case file: topic, expectations, and config overrides.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CaseFile {
    pub case: CaseMeta,
    pub expect: Expectation,
    #[serde(default)]
    pub config: CaseConfig,
}

/// Case metadata: identifier and topic.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CaseMeta {
    /// Unique identifier (slug format: `[a-z0-9_-]+`).
    pub id: String,
    /// Topic handed to the orchestrator.
    pub topic: String,
}

/// Labels the run is scored against.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Expectation {
    /// Expected classifier word (`factual`, `debatable`, or `other`).
    pub topic_type: String,
    /// Expected route; `unknown` is not a valid expectation.
    pub behavior: Behavior,
}

/// Orchestrator overrides for the case.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CaseConfig {
    pub max_rounds: Option<u32>,
}

impl CaseFile {
    /// Load and validate a case file from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read case {}", path.display()))?;
        let case: CaseFile =
            toml::from_str(&contents).with_context(|| format!("parse case {}", path.display()))?;
        case.validate()
            .with_context(|| format!("validate case {}", path.display()))?;
        Ok(case)
    }

    #[cfg(test)]
    pub fn parse_str(contents: &str) -> Result<Self> {
        let case: CaseFile = toml::from_str(contents).context("parse case")?;
        case.validate()?;
        Ok(case)
    }

    fn validate(&self) -> Result<()> {
        validate_case_id(&self.case.id)?;
        if self.case.topic.trim().is_empty() {
            bail!("case.topic must be non-empty");
        }
        if !matches!(
            self.expect.topic_type.as_str(),
            "factual" | "debatable" | "other"
        ) {
            bail!(
                "expect.topic_type must be factual, debatable, or other (got {})",
                self.expect.topic_type
            );
        }
        if self.expect.behavior == Behavior::Unknown {
            bail!("expect.behavior must be direct_answer or full_debate");
        }
        if let Some(max_rounds) = self.config.max_rounds
            && max_rounds == 0
        {
            bail!("config.max_rounds must be > 0");
        }
        Ok(())
    }
}

/// Sorted paths of every `*.toml` file in `dir`; empty if `dir` is missing.
pub fn case_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read cases dir {}", dir.display()))? {
        let entry = entry.context("read case entry")?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Discover and load all case files from a directory.
///
/// Returns cases sorted by id. Errors if duplicate ids are found.
pub fn discover_cases(dir: &Path) -> Result<Vec<CaseFile>> {
    let mut cases = case_paths(dir)?
        .iter()
        .map(|path| CaseFile::load(path))
        .collect::<Result<Vec<_>>>()?;
    cases.sort_by(|left, right| left.case.id.cmp(&right.case.id));
    for pair in cases.windows(2) {
        if pair[0].case.id == pair[1].case.id {
            return Err(anyhow!("duplicate case.id {}", pair[0].case.id));
        }
    }
    Ok(cases)
}

pub fn validate_case_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        bail!("case.id must be non-empty");
    }
    if !id
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
    {
        bail!("case.id must use [a-z0-9_-] only");
    }
    Ok(())
}
