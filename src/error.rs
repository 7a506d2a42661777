//! Error types for experience-metrics operations.
//!
//! One error enum per subsystem:
//! - Experience runner (input directory, artifact flush)
//! - Run-log artifact loading and parsing
//! - Metrics manifest construction and decoding
//! - Evaluator configuration
//! - Metric evaluation and manifest output
//! - Batch summaries over several manifests

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the experience runner.
///
/// Failures while processing individual assets are not errors: they are
/// recorded in the run log and the run is marked incomplete.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Experience not found: '{0}' is missing, not a directory, or empty")]
    ExperienceNotFound(PathBuf),

    #[error("Failed to create output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write run log '{path}': {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while loading a run-log artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Run log not found at '{0}'")]
    NotFound(PathBuf),

    #[error("Run log '{path}' is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Failed to read run log '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while building or decoding a metrics manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Metric '{0}' already exists in manifest")]
    DuplicateMetric(String),

    #[error("Manifest job_status '{stored}' does not match its metrics (expected '{expected}')")]
    JobStatusMismatch { stored: String, expected: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading evaluator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors that can occur during metric evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Failed to write manifest '{path}': {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while summarizing a batch of manifests.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("No manifests to summarize")]
    EmptyBatch,

    #[error("Failed to read manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest '{path}': {source}")]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error("min_success_rate must be between 0 and 100, got {0}")]
    InvalidThreshold(f64),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Errors that abort the in-process pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),
}
