//! Metrics manifest: named, classified metrics and the job verdict derived
//! from them.
//!
//! The manifest never stores a job status of its own. [`MetricsManifest::job_status`]
//! aggregates the metrics on every call, and serialization writes that
//! aggregate, so the summary cannot drift from the detail.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Classification of a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricStatus {
    Passed,
    Failed,
    /// No measurement was possible; never blocks the job.
    NoValue,
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricStatus::Passed => write!(f, "PASSED"),
            MetricStatus::Failed => write!(f, "FAILED"),
            MetricStatus::NoValue => write!(f, "NO_VALUE"),
        }
    }
}

/// Overall verdict of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Passed,
    Failed,
}

impl JobStatus {
    /// FAILED if any metric failed, PASSED otherwise.
    pub fn aggregate(metrics: &[Metric]) -> Self {
        if metrics.iter().any(|m| m.status == MetricStatus::Failed) {
            JobStatus::Failed
        } else {
            JobStatus::Passed
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Passed => write!(f, "PASSED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One named measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Unique within a manifest.
    pub name: String,
    pub status: MetricStatus,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub description: String,
}

impl Metric {
    /// Creates a metric with no value, unit or description.
    pub fn new(name: impl Into<String>, status: MetricStatus) -> Self {
        Self {
            name: name.into(),
            status,
            value: None,
            unit: None,
            description: String::new(),
        }
    }

    /// Sets the measured value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the measured value, if any.
    pub fn with_optional_value(mut self, value: Option<f64>) -> Self {
        self.value = value;
        self
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// The terminal artifact of an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsManifest {
    metrics: Vec<Metric>,
}

impl MetricsManifest {
    /// Builds a manifest, rejecting duplicate metric names.
    pub fn new(metrics: Vec<Metric>) -> Result<Self, ManifestError> {
        let mut seen = HashSet::new();
        for metric in &metrics {
            if !seen.insert(metric.name.as_str()) {
                return Err(ManifestError::DuplicateMetric(metric.name.clone()));
            }
        }
        Ok(Self { metrics })
    }

    /// Aggregated job status.
    pub fn job_status(&self) -> JobStatus {
        JobStatus::aggregate(&self.metrics)
    }

    /// Metrics in insertion order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Looks up a metric by name.
    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Pretty JSON document with a trailing newline.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Decodes a manifest document, checking names and the stored job status.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let document: OwnedDocument = serde_json::from_str(json)?;
        let manifest = Self::new(document.metrics)?;
        let expected = manifest.job_status();
        if document.job_status != expected {
            return Err(ManifestError::JobStatusMismatch {
                stored: document.job_status.to_string(),
                expected: expected.to_string(),
            });
        }
        Ok(manifest)
    }
}

#[derive(Serialize)]
struct Document<'a> {
    job_status: JobStatus,
    metrics: &'a [Metric],
}

#[derive(Deserialize)]
struct OwnedDocument {
    job_status: JobStatus,
    metrics: Vec<Metric>,
}

impl Serialize for MetricsManifest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Document {
            job_status: self.job_status(),
            metrics: &self.metrics,
        }
        .serialize(serializer)
    }
}
