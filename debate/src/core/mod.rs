//! Deterministic, pure logic shared by the debate orchestrator.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod budget;
pub mod routing;
pub mod state_update;
pub mod transcript;
pub mod types;
