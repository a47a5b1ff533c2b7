//! Transcript entry format.
//!
//! Downstream scanners match the speaker labels and the judge marker
//! literally, so the strings produced here are a stable contract.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::core::types::Speaker;

/// Fixed substring that locates the verdict inside a transcript.
pub const JUDGE_MARKER: &str = "JUDGE'S FINAL VERDICT:";

const RULE_WIDTH: usize = 50;

static TURN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\[Round (\d+)\] (Proponent|Opponent): (.*)$").expect("turn regex is valid")
});

/// Transcript entry that does not match the documented label format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("malformed transcript entry {index}: {reason}")]
    Malformed { index: usize, reason: String },
}

/// Parsed view of one `history` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Turn {
        round: u32,
        speaker: Speaker,
        text: String,
    },
    Verdict {
        text: String,
    },
}

/// Format a debate turn: `[Round {round}] {Speaker}: {text}`.
pub fn turn_entry(round: u32, speaker: Speaker, text: &str) -> String {
    format!("[Round {round}] {}: {text}", speaker.label())
}

/// Wrap a judge completion with the delimited verdict header.
pub fn verdict_entry(text: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("\n{rule}\n{JUDGE_MARKER}\n{rule}\n{text}")
}

/// Join entries into a single transcript blob (blank line between entries).
pub fn join_transcript(history: &[String]) -> String {
    history.join("\n\n")
}

/// Parse one entry; `index` is only used for error reporting.
///
/// A labelled turn stays a turn even when its text quotes the verdict marker.
pub fn parse_entry(index: usize, entry: &str) -> Result<TranscriptEntry, TranscriptError> {
    let Some(caps) = TURN_RE.captures(entry) else {
        let pos = entry
            .find(JUDGE_MARKER)
            .ok_or_else(|| TranscriptError::Malformed {
                index,
                reason: "missing `[Round N] Speaker:` label".to_string(),
            })?;
        let rest = &entry[pos + JUDGE_MARKER.len()..];
        let text = rest
            .trim_start_matches('\n')
            .trim_start_matches('=')
            .trim_start_matches('\n');
        return Ok(TranscriptEntry::Verdict {
            text: text.to_string(),
        });
    };

    let round = caps[1]
        .parse::<u32>()
        .map_err(|err| TranscriptError::Malformed {
            index,
            reason: format!("round number: {err}"),
        })?;
    let speaker = match &caps[2] {
        "Proponent" => Speaker::Proponent,
        _ => Speaker::Opponent,
    };
    Ok(TranscriptEntry::Turn {
        round,
        speaker,
        text: caps[3].to_string(),
    })
}

/// Label counts used by completeness checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptSummary {
    pub proponent_turns: usize,
    pub opponent_turns: usize,
    pub verdicts: usize,
    pub malformed: Vec<TranscriptError>,
}

impl TranscriptSummary {
    pub fn has_verdict(&self) -> bool {
        self.verdicts > 0
    }
}

/// Count speaker turns and verdicts, collecting malformed entries.
pub fn summarize(history: &[String]) -> TranscriptSummary {
    let mut summary = TranscriptSummary::default();
    for (index, entry) in history.iter().enumerate() {
        match parse_entry(index, entry) {
            Ok(TranscriptEntry::Turn {
                speaker: Speaker::Proponent,
                ..
            }) => summary.proponent_turns += 1,
            Ok(TranscriptEntry::Turn {
                speaker: Speaker::Opponent,
                ..
            }) => summary.opponent_turns += 1,
            Ok(TranscriptEntry::Verdict { .. }) => summary.verdicts += 1,
            Err(err) => summary.malformed.push(err),
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_entry_uses_fixed_label_format() {
        let entry = turn_entry(2, Speaker::Opponent, "Cheese is enough.");
        assert_eq!(entry, "[Round 2] Opponent: Cheese is enough.");
    }

    #[test]
    fn parses_multiline_turn() {
        let entry = turn_entry(1, Speaker::Proponent, "line one\nline two");
        let parsed = parse_entry(0, &entry).expect("parse");
        assert_eq!(
            parsed,
            TranscriptEntry::Turn {
                round: 1,
                speaker: Speaker::Proponent,
                text: "line one\nline two".to_string(),
            }
        );
    }

    #[test]
    fn verdict_entry_is_located_by_marker() {
        let entry = verdict_entry("Proponent wins.");
        assert!(entry.contains(JUDGE_MARKER));
        let parsed = parse_entry(6, &entry).expect("parse");
        assert_eq!(
            parsed,
            TranscriptEntry::Verdict {
                text: "Proponent wins.".to_string()
            }
        );
    }

    #[test]
    fn rejects_unlabeled_entry() {
        let err = parse_entry(3, "Agent A: hello").unwrap_err();
        assert!(matches!(err, TranscriptError::Malformed { index: 3, .. }));
    }

    #[test]
    fn summarize_counts_labels_and_malformed_entries() {
        let history = vec![
            turn_entry(1, Speaker::Proponent, "a"),
            turn_entry(1, Speaker::Opponent, "b"),
            "garbage".to_string(),
            verdict_entry("done"),
        ];
        let summary = summarize(&history);
        assert_eq!(summary.proponent_turns, 1);
        assert_eq!(summary.opponent_turns, 1);
        assert_eq!(summary.verdicts, 1);
        assert_eq!(summary.malformed.len(), 1);
        assert!(summary.has_verdict());
    }

    #[test]
    fn turn_quoting_the_verdict_marker_is_still_a_turn() {
        let history = vec![
            turn_entry(
                1,
                Speaker::Proponent,
                &format!("As the {JUDGE_MARKER} will show, I win."),
            ),
            turn_entry(1, Speaker::Opponent, "no"),
        ];
        let summary = summarize(&history);
        assert_eq!(summary.proponent_turns, 1);
        assert_eq!(summary.opponent_turns, 1);
        assert_eq!(summary.verdicts, 0);
        assert!(summary.malformed.is_empty());
        assert!(!summary.has_verdict());
    }
}
