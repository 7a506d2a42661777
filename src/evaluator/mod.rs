//! Metrics evaluator.
//!
//! Turns one run record into one metrics manifest:
//!
//! ```text
//! run.log → codec::load → RunRecord → metric rules → MetricsManifest → job_metrics.json
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use experience_metrics::evaluator::{Evaluator, EvaluatorConfig};
//!
//! let config = EvaluatorConfig::load(None)?.with_warning_threshold(2);
//! let evaluation = Evaluator::new(config).run(
//!     Path::new("/tmp/resim/inputs/logs/run.log"),
//!     Path::new("/tmp/resim/outputs/job_metrics.json"),
//! )?;
//! println!("job status: {}", evaluation.job_status());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod config;
pub mod evaluate;
pub mod rules;

pub use batch::{summarize_batch, summarize_manifests, BatchConfig};
pub use config::EvaluatorConfig;
pub use evaluate::{write_manifest, Evaluation, Evaluator};
pub use rules::{EvaluationContext, MetricRule, STANDARD_RULES};
