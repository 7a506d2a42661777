//! experience-metrics: run simulation experiences and evaluate their run logs.
//!
//! This library provides the two stages of a post-simulation pipeline and the
//! artifact that connects them:
//!
//! - [`runner`] executes an experience and flushes a `run-log/1` artifact,
//!   even when the run fails part way.
//! - [`evaluator`] derives named, classified metrics from a run record and
//!   writes a [`MetricsManifest`] with the aggregated job status.
//! - [`pipeline`] runs both in one process, handing the typed record over
//!   directly.

pub mod artifact;
pub mod cli;
pub mod error;
pub mod evaluator;
pub mod manifest;
pub mod pipeline;
pub mod runner;

// Re-export commonly used error types
pub use error::{
    ArtifactError, BatchError, ConfigError, EvaluatorError, ManifestError, PipelineError,
    RunnerError,
};
pub use manifest::{JobStatus, Metric, MetricStatus, MetricsManifest};
