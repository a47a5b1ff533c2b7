//! Topic-routed debate CLI.
//!
//! Classifies a topic through the configured generator command, then prints
//! either a direct answer or the full debate transcript with the judge's
//! verdict.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use debate::core::types::DebateState;
use debate::exit_codes;
use debate::io::config::{DEFAULT_CONFIG_FILE, DebateConfig, load_config, write_config};
use debate::io::generator::CommandGenerator;
use debate::io::run_log::write_run;
use debate::{Orchestrator, OrchestratorConfig};

const BANNER_WIDTH: usize = 60;

#[derive(Parser)]
#[command(
    name = "debate",
    version,
    about = "Answer factual topics directly; debate the rest and judge the result"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file if missing.
    Init {
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
        /// Config file to create.
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Classify a topic, then answer it directly or run a judged debate.
    Run {
        /// Topic to route. Prompted for on stdin when omitted.
        topic: Option<String>,
        /// Number of debate rounds (overrides the config file).
        #[arg(long)]
        max_rounds: Option<u32>,
        /// Config file (missing file means defaults).
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Directory for `state.json` and `transcript.md`.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print the run report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

struct RunArgs {
    topic: Option<String>,
    max_rounds: Option<u32>,
    config: PathBuf,
    out: Option<PathBuf>,
    json: bool,
}

fn main() {
    debate::logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force, config } => {
            cmd_init(&config, force)?;
            Ok(exit_codes::OK)
        }
        Command::Run {
            topic,
            max_rounds,
            config,
            out,
            json,
        } => cmd_run(RunArgs {
            topic,
            max_rounds,
            config,
            out,
            json,
        }),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        println!("{} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }
    write_config(path, &DebateConfig::default())
        .with_context(|| format!("write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_run(args: RunArgs) -> Result<i32> {
    let mut cfg = load_config(&args.config)?;
    if let Some(max_rounds) = args.max_rounds {
        cfg.max_rounds = max_rounds;
        cfg.validate().context("--max-rounds")?;
    }
    let topic = resolve_topic(args.topic)?;

    let generator = CommandGenerator::from_config(&cfg)?;
    let orchestrator = Orchestrator::new(generator, OrchestratorConfig::from_config(&cfg));
    let result = orchestrator.run_observed(&topic, cfg.max_rounds, |step, state| {
        info!(
            step = %step,
            round = state.round_number(),
            entries = state.history().len(),
            "step applied"
        );
    });

    match result {
        Ok(state) => {
            if let Some(dir) = &args.out {
                write_run(dir, &state, None)?;
            }
            print_state(&state, args.json)?;
            Ok(exit_codes::OK)
        }
        Err(failure) => {
            if let Some(dir) = &args.out {
                write_run(dir, &failure.state, Some(&failure.to_string()))?;
            }
            eprintln!("error: {failure}");
            if !failure.state.history().is_empty() {
                eprintln!("partial transcript:");
                for entry in failure.state.history() {
                    eprintln!("{entry}\n");
                }
            }
            Ok(exit_codes::for_failure(&failure.kind))
        }
    }
}

/// Use the topic argument, or prompt for one on stdin.
fn resolve_topic(arg: Option<String>) -> Result<String> {
    let raw = match arg {
        Some(topic) => topic,
        None => {
            print!("Enter a debate topic: ");
            std::io::stdout().flush().context("flush stdout")?;
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("read topic from stdin")?;
            line
        }
    };
    let topic = raw.trim();
    if topic.is_empty() {
        bail!("topic must be non-empty");
    }
    Ok(topic.to_string())
}

fn print_state(state: &DebateState, json: bool) -> Result<()> {
    if json {
        let payload =
            serde_json::to_string_pretty(&state.report()).context("serialize run report")?;
        println!("{payload}");
        return Ok(());
    }

    let rule = "=".repeat(BANNER_WIDTH);
    println!("\n{rule}\nFINAL DEBATE OUTPUT\n{rule}\n");
    match state.final_response() {
        Some(answer) => println!("{answer}"),
        None => {
            for entry in state.history() {
                println!("{entry}");
                println!();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["debate", "init"]);
        assert!(matches!(cli.command, Command::Init { force: false, .. }));
    }

    #[test]
    fn parse_run_with_overrides() {
        let cli = Cli::parse_from([
            "debate",
            "run",
            "Is remote work better than office work?",
            "--max-rounds",
            "2",
            "--json",
        ]);
        match cli.command {
            Command::Run {
                topic,
                max_rounds,
                config,
                out,
                json,
            } => {
                assert_eq!(
                    topic.as_deref(),
                    Some("Is remote work better than office work?")
                );
                assert_eq!(max_rounds, Some(2));
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG_FILE));
                assert!(out.is_none());
                assert!(json);
            }
            Command::Init { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn parse_run_without_topic() {
        let cli = Cli::parse_from(["debate", "run"]);
        assert!(matches!(cli.command, Command::Run { topic: None, .. }));
    }

    #[test]
    fn blank_topic_argument_is_rejected() {
        let err = resolve_topic(Some("   ".to_string())).unwrap_err();
        assert!(err.to_string().contains("topic must be non-empty"));
    }
}
