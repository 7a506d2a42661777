//! Command-line interface for experience-metrics.
//!
//! Provides commands for running experiences, evaluating run logs, running
//! both in one process, and summarizing batches of jobs.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
