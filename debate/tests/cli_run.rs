//! CLI tests for `debate run`.
//!
//! Spawns the debate binary with a `sh -c` generator command and verifies
//! exit codes and printed output.

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::Command;

use debate::exit_codes;
use debate::io::config::{DebateConfig, GeneratorConfig, write_config};

/// Write a config whose generator ignores the prompt and prints `reply`.
fn write_echo_config(dir: &Path, reply: &str) -> std::path::PathBuf {
    let path = dir.join("debate.toml");
    let cfg = DebateConfig {
        generation_timeout_secs: 10,
        generator: GeneratorConfig {
            command: vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("cat >/dev/null; echo '{reply}'"),
            ],
        },
        ..DebateConfig::default()
    };
    write_config(&path, &cfg).expect("write config");
    path
}

#[test]
fn factual_topic_prints_direct_answer() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = write_echo_config(temp.path(), "factual");

    let output = Command::new(env!("CARGO_BIN_EXE_debate"))
        .current_dir(temp.path())
        .arg("run")
        .arg("What is the boiling point of water?")
        .arg("--config")
        .arg(&config)
        .output()
        .expect("debate run");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FINAL DEBATE OUTPUT"));
    assert!(stdout.contains("factual"));
}

#[test]
fn unclassified_topic_exits_with_unclassified_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = write_echo_config(temp.path(), "banana");
    let out_dir = temp.path().join("run");

    let output = Command::new(env!("CARGO_BIN_EXE_debate"))
        .current_dir(temp.path())
        .arg("run")
        .arg("Why is the sky blue?")
        .arg("--config")
        .arg(&config)
        .arg("--out")
        .arg(&out_dir)
        .output()
        .expect("debate run");

    assert_eq!(output.status.code(), Some(exit_codes::UNCLASSIFIED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unclassified route"));
    let error = fs::read_to_string(out_dir.join("error.txt")).expect("error.txt");
    assert!(error.contains("banana"));
    assert!(out_dir.join("state.json").is_file());
}

#[test]
fn blank_classifier_reply_exits_with_unclassified_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = write_echo_config(temp.path(), "");

    let status = Command::new(env!("CARGO_BIN_EXE_debate"))
        .current_dir(temp.path())
        .arg("run")
        .arg("Why is the sky blue?")
        .arg("--config")
        .arg(&config)
        .status()
        .expect("debate run");

    assert_eq!(status.code(), Some(exit_codes::UNCLASSIFIED));
}

#[test]
fn failing_generator_exits_with_generation_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("debate.toml");
    let cfg = DebateConfig {
        generator: GeneratorConfig {
            command: vec!["sh".to_string(), "-c".to_string(), "exit 7".to_string()],
        },
        ..DebateConfig::default()
    };
    write_config(&path, &cfg).expect("write config");

    let status = Command::new(env!("CARGO_BIN_EXE_debate"))
        .current_dir(temp.path())
        .arg("run")
        .arg("Is remote work better than office work?")
        .arg("--config")
        .arg(&path)
        .status()
        .expect("debate run");

    assert_eq!(status.code(), Some(exit_codes::GENERATION_FAILED));
}

#[test]
fn zero_max_rounds_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = write_echo_config(temp.path(), "debatable");

    let status = Command::new(env!("CARGO_BIN_EXE_debate"))
        .current_dir(temp.path())
        .args(["run", "topic", "--max-rounds", "0", "--config"])
        .arg(&config)
        .status()
        .expect("debate run");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn init_writes_default_config() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = Command::new(env!("CARGO_BIN_EXE_debate"))
        .current_dir(temp.path())
        .arg("init")
        .status()
        .expect("debate init");

    assert_eq!(status.code(), Some(exit_codes::OK));
    let contents = fs::read_to_string(temp.path().join("debate.toml")).expect("config");
    assert!(contents.contains("max_rounds = 3"));
}
