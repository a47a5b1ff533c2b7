//! Run artifacts written with `debate run --out DIR`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::types::DebateState;

#[derive(Debug, Clone)]
pub struct RunPaths {
    pub dir: PathBuf,
    pub state_path: PathBuf,
    pub transcript_path: PathBuf,
    pub error_path: PathBuf,
}

impl RunPaths {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            state_path: dir.join("state.json"),
            transcript_path: dir.join("transcript.md"),
            error_path: dir.join("error.txt"),
        }
    }
}

/// Write the final (or partial) state, its transcript, and the failure if any.
pub fn write_run(dir: &Path, state: &DebateState, error: Option<&str>) -> Result<RunPaths> {
    let paths = RunPaths::new(dir);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create run dir {}", paths.dir.display()))?;

    write_json(&paths.state_path, state)?;
    write_text(&paths.transcript_path, &render_transcript(state))?;
    match error {
        Some(message) => write_text(&paths.error_path, &format!("{message}\n"))?,
        None if paths.error_path.exists() => fs::remove_file(&paths.error_path)
            .with_context(|| format!("remove stale {}", paths.error_path.display()))?,
        None => {}
    }

    Ok(paths)
}

/// Markdown rendering of a run, used for `transcript.md`.
pub fn render_transcript(state: &DebateState) -> String {
    let mut buf = String::new();
    buf.push_str(&format!("# {}\n\n", state.topic()));
    buf.push_str(&format!("- topic_type: {}\n", state.topic_type()));
    buf.push_str(&format!("- round_number: {}\n", state.round_number()));
    buf.push_str(&format!("- max_rounds: {}\n\n", state.max_rounds()));
    if let Some(answer) = state.final_response() {
        buf.push_str("## Answer\n\n");
        buf.push_str(answer);
        buf.push('\n');
    }
    if !state.history().is_empty() {
        buf.push_str("## Transcript\n\n");
        for entry in state.history() {
            buf.push_str(entry.trim_start_matches('\n'));
            buf.push_str("\n\n");
        }
    }
    buf
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    write_text(path, &buf)
}
