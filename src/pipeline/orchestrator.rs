//! Pipeline orchestrator coordinating the runner and the evaluator.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::PipelineError;
use crate::evaluator::{write_manifest, Evaluator};
use crate::manifest::{JobStatus, MetricsManifest};
use crate::runner::{ExperienceRunner, RunOutcome, RunnerConfig};

/// Manifest file name inside the runner output directory.
pub const MANIFEST_FILE_NAME: &str = "job_metrics.json";

/// Both halves of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run: RunOutcome,
    pub manifest: MetricsManifest,
    pub manifest_path: PathBuf,
}

impl PipelineOutcome {
    /// Aggregated job status of the manifest.
    pub fn job_status(&self) -> JobStatus {
        self.manifest.job_status()
    }
}

/// Runs the experience described by `runner_config` and evaluates the
/// resulting record.
///
/// The manifest goes to `manifest_path`, or to `<output_dir>/job_metrics.json`
/// when none is given.
///
/// # Errors
///
/// Returns the runner's fatal errors (missing experience, unwritable output)
/// and the evaluator's write errors. A FAILED job is not an error.
pub fn run_pipeline(
    runner_config: &RunnerConfig,
    evaluator: &Evaluator,
    manifest_path: Option<&Path>,
) -> Result<PipelineOutcome, PipelineError> {
    let run = ExperienceRunner::new(runner_config.clone()).run()?;

    // The record never went through text, so there is nothing to skip.
    let manifest = evaluator.evaluate_record(&run.record, 0)?;

    let manifest_path = manifest_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| runner_config.output_dir.join(MANIFEST_FILE_NAME));
    write_manifest(&manifest, &manifest_path)?;

    info!(
        "Pipeline for '{}' finished: {} -> {}",
        run.experience.name,
        manifest.job_status(),
        manifest_path.display()
    );

    Ok(PipelineOutcome {
        run,
        manifest,
        manifest_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluatorConfig;
    use crate::manifest::MetricStatus;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_pipeline_writes_manifest_next_to_outputs() {
        let exp = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(exp.path().join("flight_log.json"), "{}").unwrap();

        let config = RunnerConfig::new(exp.path()).with_output_dir(out.path());
        let outcome = run_pipeline(&config, &Evaluator::default(), None).unwrap();

        assert_eq!(outcome.manifest_path, out.path().join(MANIFEST_FILE_NAME));
        assert_eq!(outcome.job_status(), JobStatus::Passed);
        let written = fs::read_to_string(&outcome.manifest_path).unwrap();
        assert_eq!(written, outcome.manifest.to_json().unwrap());
        assert!(outcome.run.artifact_path.exists());
    }

    #[test]
    fn test_pipeline_reports_failed_job_without_error() {
        let exp = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(exp.path().join("broken.json"), "not json").unwrap();

        let config = RunnerConfig::new(exp.path()).with_output_dir(out.path());
        let evaluator = Evaluator::new(EvaluatorConfig::default());
        let manifest_path = out.path().join("custom/metrics.json");
        let outcome = run_pipeline(&config, &evaluator, Some(&manifest_path)).unwrap();

        assert_eq!(outcome.manifest_path, manifest_path);
        assert_eq!(outcome.job_status(), JobStatus::Failed);
        assert_eq!(
            outcome.manifest.get("warning_count").unwrap().status,
            MetricStatus::Failed
        );
        assert!(manifest_path.exists());
    }

    #[test]
    fn test_pipeline_missing_experience_writes_no_manifest() {
        let out = TempDir::new().unwrap();
        let config = RunnerConfig::new(out.path().join("missing")).with_output_dir(out.path());

        let err = run_pipeline(&config, &Evaluator::default(), None).unwrap_err();
        assert!(matches!(err, PipelineError::Runner(_)));
        assert!(!out.path().join(MANIFEST_FILE_NAME).exists());
    }
}
