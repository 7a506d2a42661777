//! Experience runner.
//!
//! Executes one experience and leaves a run log behind for the evaluator.
//!
//! # Architecture
//!
//! ```text
//! Experience dir → ExperienceRunner → assets/ + logs/run.log → Evaluator
//! ```
//!
//! The runner:
//! 1. Opens the experience directory (fatal if missing or empty)
//! 2. Copies every asset into the output directory, recording each step
//! 3. Records failures as ERROR events instead of aborting the process
//! 4. Always flushes the run log, with `RUN_COMPLETE=false` on early exit
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use experience_metrics::runner::{ExperienceRunner, RunnerConfig};
//!
//! let config = RunnerConfig::new("./experiences/square-flight")
//!     .with_output_dir("/tmp/resim/outputs")
//!     .with_time_budget(Duration::from_secs(600));
//!
//! let outcome = ExperienceRunner::new(config).run()?;
//! println!("completed: {}", outcome.record.completed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod executor;
pub mod experience;

pub use config::{RunnerConfig, DEFAULT_OUTPUT_DIR};
pub use executor::{write_artifact, ExperienceRunner, RunOutcome};
pub use experience::Experience;
