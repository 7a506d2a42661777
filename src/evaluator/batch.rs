//! Batch summaries: roll several job manifests up into one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::BatchError;
use crate::manifest::{JobStatus, Metric, MetricStatus, MetricsManifest};

/// Thresholds for batch summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Minimum share of passed jobs, in percent.
    pub min_success_rate: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_success_rate: 70.0,
        }
    }
}

impl BatchConfig {
    /// Sets the minimum success rate.
    pub fn with_min_success_rate(mut self, percent: f64) -> Self {
        self.min_success_rate = percent;
        self
    }

    fn validate(&self) -> Result<(), BatchError> {
        if !(0.0..=100.0).contains(&self.min_success_rate) {
            return Err(BatchError::InvalidThreshold(self.min_success_rate));
        }
        Ok(())
    }
}

/// Reads the manifests at `paths` and summarizes them.
pub fn summarize_batch(paths: &[PathBuf], config: &BatchConfig) -> Result<MetricsManifest, BatchError> {
    let manifests = paths
        .iter()
        .map(|path| read_manifest(path))
        .collect::<Result<Vec<_>, _>>()?;
    summarize_manifests(&manifests, config)
}

/// Summarizes already loaded manifests.
pub fn summarize_manifests(
    manifests: &[MetricsManifest],
    config: &BatchConfig,
) -> Result<MetricsManifest, BatchError> {
    config.validate()?;
    if manifests.is_empty() {
        return Err(BatchError::EmptyBatch);
    }

    let job_count = manifests.len();
    let passed_jobs = manifests
        .iter()
        .filter(|m| m.job_status() == JobStatus::Passed)
        .count();
    let success_rate = passed_jobs as f64 / job_count as f64 * 100.0;
    let total_warnings = sum_metric(manifests, "warning_count");
    let total_errors = sum_metric(manifests, "error_count");

    info!(
        "Batch of {} jobs: {} passed ({:.1}%)",
        job_count, passed_jobs, success_rate
    );

    let rate_status = if success_rate < config.min_success_rate {
        MetricStatus::Failed
    } else {
        MetricStatus::Passed
    };

    let metrics = vec![
        Metric::new("job_count", MetricStatus::Passed)
            .with_value(job_count as f64)
            .with_description("Number of jobs in the batch"),
        Metric::new("passed_jobs", MetricStatus::Passed)
            .with_value(passed_jobs as f64)
            .with_description("Number of jobs whose status is PASSED"),
        Metric::new("success_rate", rate_status)
            .with_value(success_rate)
            .with_unit("%")
            .with_description(format!(
                "Share of passed jobs (fails below {}%)",
                config.min_success_rate
            )),
        Metric::new("total_warnings", MetricStatus::Passed)
            .with_value(total_warnings)
            .with_description("Sum of warning_count across jobs"),
        Metric::new("total_errors", MetricStatus::Passed)
            .with_value(total_errors)
            .with_description("Sum of error_count across jobs"),
    ];

    Ok(MetricsManifest::new(metrics)?)
}

fn read_manifest(path: &Path) -> Result<MetricsManifest, BatchError> {
    debug!("Reading manifest {}", path.display());
    let json = fs::read_to_string(path).map_err(|e| BatchError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    MetricsManifest::from_json(&json).map_err(|e| BatchError::InvalidManifest {
        path: path.to_path_buf(),
        source: e,
    })
}

fn sum_metric(manifests: &[MetricsManifest], name: &str) -> f64 {
    manifests
        .iter()
        .filter_map(|m| m.get(name).and_then(|metric| metric.value))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job(warnings: f64, errors: f64) -> MetricsManifest {
        let status = |v: f64| {
            if v > 0.0 {
                MetricStatus::Failed
            } else {
                MetricStatus::Passed
            }
        };
        MetricsManifest::new(vec![
            Metric::new("warning_count", status(warnings)).with_value(warnings),
            Metric::new("error_count", status(errors)).with_value(errors),
        ])
        .unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let manifests = vec![job(0.0, 0.0), job(2.0, 0.0), job(0.0, 1.0), job(0.0, 0.0)];
        let summary = summarize_manifests(&manifests, &BatchConfig::default()).unwrap();

        assert_eq!(summary.get("job_count").unwrap().value, Some(4.0));
        assert_eq!(summary.get("passed_jobs").unwrap().value, Some(2.0));
        assert_eq!(summary.get("success_rate").unwrap().value, Some(50.0));
        assert_eq!(summary.get("total_warnings").unwrap().value, Some(2.0));
        assert_eq!(summary.get("total_errors").unwrap().value, Some(1.0));
        assert_eq!(summary.job_status(), JobStatus::Failed);
    }

    #[test]
    fn test_success_rate_threshold() {
        let manifests = vec![job(0.0, 0.0), job(0.0, 0.0), job(0.0, 0.0), job(1.0, 0.0)];

        let default = summarize_manifests(&manifests, &BatchConfig::default()).unwrap();
        assert_eq!(default.job_status(), JobStatus::Passed);

        let strict = BatchConfig::default().with_min_success_rate(80.0);
        let summary = summarize_manifests(&manifests, &strict).unwrap();
        assert_eq!(summary.get("success_rate").unwrap().status, MetricStatus::Failed);
    }

    #[test]
    fn test_empty_batch() {
        assert!(matches!(
            summarize_manifests(&[], &BatchConfig::default()),
            Err(BatchError::EmptyBatch)
        ));
    }

    #[test]
    fn test_invalid_threshold() {
        let config = BatchConfig::default().with_min_success_rate(120.0);
        assert!(matches!(
            summarize_manifests(&[job(0.0, 0.0)], &config),
            Err(BatchError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_summarize_batch_reads_files() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.json");
        let b = temp.path().join("b.json");
        fs::write(&a, job(0.0, 0.0).to_json().unwrap()).unwrap();
        fs::write(&b, job(0.0, 3.0).to_json().unwrap()).unwrap();

        let summary = summarize_batch(&[a, b], &BatchConfig::default()).unwrap();
        assert_eq!(summary.get("total_errors").unwrap().value, Some(3.0));
    }

    #[test]
    fn test_summarize_batch_names_bad_file() {
        let temp = TempDir::new().unwrap();
        let bad = temp.path().join("bad.json");
        fs::write(&bad, "{\"job_status\": \"PASSED\"}").unwrap();

        match summarize_batch(&[bad.clone()], &BatchConfig::default()) {
            Err(BatchError::InvalidManifest { path, .. }) => assert_eq!(path, bad),
            other => panic!("expected InvalidManifest, got {:?}", other),
        }
    }
}
