//! In-process pipeline: run an experience, then evaluate it.
//!
//! The runner hands its typed [`RunRecord`](crate::artifact::RunRecord)
//! straight to the evaluator, so nothing is re-parsed from text. The run log
//! is still flushed to disk, which keeps the two stages usable as separate
//! processes.
//!
//! # Example
//!
//! ```no_run
//! use experience_metrics::evaluator::{Evaluator, EvaluatorConfig};
//! use experience_metrics::pipeline::run_pipeline;
//! use experience_metrics::runner::RunnerConfig;
//!
//! let runner = RunnerConfig::new("./experiences/square-flight");
//! let evaluator = Evaluator::new(EvaluatorConfig::load(None)?);
//!
//! let outcome = run_pipeline(&runner, &evaluator, None)?;
//! println!("{} -> {}", outcome.job_status(), outcome.manifest_path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod orchestrator;

pub use orchestrator::{run_pipeline, PipelineOutcome, MANIFEST_FILE_NAME};
