//! The metrics evaluator: run record in, metrics manifest out.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::artifact::{self, ParsedArtifact, RunRecord};
use crate::error::EvaluatorError;
use crate::manifest::{JobStatus, MetricsManifest};

use super::config::EvaluatorConfig;
use super::rules::{EvaluationContext, MetricRule, STANDARD_RULES};

/// Result of evaluating one run.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub manifest: MetricsManifest,
    /// Lines of the run log that were skipped.
    pub parse_warning_count: usize,
    /// True when the run log had no completion sentinel.
    pub completion_marker_missing: bool,
}

impl Evaluation {
    /// Aggregated job status of the manifest.
    pub fn job_status(&self) -> JobStatus {
        self.manifest.job_status()
    }
}

/// Derives metrics from run records.
///
/// Evaluation is a pure function of the record, the parse warning count and
/// the configuration: it never re-runs the experience.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvaluatorConfig,
    rules: Vec<MetricRule>,
}

impl Evaluator {
    /// Creates an evaluator with the standard metric set.
    pub fn new(config: EvaluatorConfig) -> Self {
        Self::with_rules(config, STANDARD_RULES.to_vec())
    }

    /// Creates an evaluator with a custom metric set.
    pub fn with_rules(config: EvaluatorConfig, rules: Vec<MetricRule>) -> Self {
        Self { config, rules }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Builds the manifest for an in-memory record.
    ///
    /// # Errors
    ///
    /// Fails with `DuplicateMetric` if two rules share a name.
    pub fn evaluate_record(
        &self,
        record: &RunRecord,
        parse_warning_count: usize,
    ) -> Result<MetricsManifest, EvaluatorError> {
        let ctx = EvaluationContext {
            record,
            parse_warning_count,
            config: &self.config,
        };

        let metrics = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(&ctx))
            .inspect(|m| debug!("Metric {}: {} ({:?})", m.name, m.status, m.value))
            .collect();

        Ok(MetricsManifest::new(metrics)?)
    }

    /// Builds the manifest for a parsed run log.
    pub fn evaluate_artifact(&self, artifact: &ParsedArtifact) -> Result<Evaluation, EvaluatorError> {
        if artifact.parse_warning_count > 0 {
            warn!(
                "Skipped {} unrecognized run log lines",
                artifact.parse_warning_count
            );
        }
        if artifact.marker_missing {
            warn!("Run log has no completion marker; treating run as incomplete");
        }

        let manifest = self.evaluate_record(&artifact.record, artifact.parse_warning_count)?;
        Ok(Evaluation {
            manifest,
            parse_warning_count: artifact.parse_warning_count,
            completion_marker_missing: artifact.marker_missing,
        })
    }

    /// Loads the run log at `artifact_path` and evaluates it.
    pub fn evaluate_path(&self, artifact_path: &Path) -> Result<Evaluation, EvaluatorError> {
        info!("Evaluating run log {}", artifact_path.display());
        let artifact = artifact::load(artifact_path)?;
        debug!(
            "Parsed {} events (completed={})",
            artifact.record.events.len(),
            artifact.record.completed
        );
        self.evaluate_artifact(&artifact)
    }

    /// Evaluates the run log at `artifact_path` and writes the manifest to
    /// `manifest_path`. Nothing is written when the run log cannot be read.
    pub fn run(&self, artifact_path: &Path, manifest_path: &Path) -> Result<Evaluation, EvaluatorError> {
        let evaluation = self.evaluate_path(artifact_path)?;
        write_manifest(&evaluation.manifest, manifest_path)?;

        info!(
            "Evaluation complete: {} ({} metrics) -> {}",
            evaluation.job_status(),
            evaluation.manifest.metrics().len(),
            manifest_path.display()
        );
        Ok(evaluation)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvaluatorConfig::default())
    }
}

/// Writes a manifest as JSON, creating parent directories and replacing any
/// existing file.
pub fn write_manifest(manifest: &MetricsManifest, path: &Path) -> Result<(), EvaluatorError> {
    let json = manifest.to_json()?;
    let write_err = |e| EvaluatorError::ManifestWrite {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, json).map_err(write_err)?;
    debug!("Saved manifest to {}", path.display());
    Ok(())
}
