//! I/O helpers for the debate orchestrator.

pub mod config;
pub mod generator;
pub mod process;
pub mod prompt;
pub mod run_log;
