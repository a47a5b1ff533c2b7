mod case;
mod checks;
mod cli;
mod config;
mod outcome;
mod report;
mod results;
mod run;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use debate::io::config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "eval", version, about = "Evaluation harness for the debate orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List cases under eval/cases.
    List,
    /// Run all cases, or one case by id, and score them.
    Run {
        #[arg(long = "case")]
        case_id: Option<String>,
        #[arg(long, default_value_t = 2)]
        concurrency: usize,
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Aggregate the results of one eval run.
    Report { eval_run_id: String },
    /// Remove eval/results.
    Clean,
}

fn main() -> Result<()> {
    debate::logging::init();
    let cli = Cli::parse();
    let repo_root = std::env::current_dir()?;
    match cli.command {
        Command::List => cli::list_cases(&repo_root),
        Command::Run {
            case_id,
            concurrency,
            config,
        } => cli::run_cases(&repo_root, case_id.as_deref(), concurrency, &config),
        Command::Report { eval_run_id } => cli::report_run(&repo_root, &eval_run_id),
        Command::Clean => cli::clean_results(&repo_root),
    }
}
