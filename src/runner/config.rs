//! Configuration for experience runs.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default output directory, shared with the orchestrator.
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/resim/outputs";

/// Configuration for running one experience.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Directory holding the experience assets.
    pub experience_dir: PathBuf,
    /// Directory receiving the run log and copied assets.
    pub output_dir: PathBuf,
    /// Experience name; defaults to the directory name.
    pub experience_name: Option<String>,
    /// Wall-clock budget for processing assets.
    pub time_budget: Option<Duration>,
}

impl RunnerConfig {
    /// Creates a run configuration with defaults.
    pub fn new(experience_dir: impl Into<PathBuf>) -> Self {
        Self {
            experience_dir: experience_dir.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            experience_name: None,
            time_budget: None,
        }
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Overrides the experience name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.experience_name = Some(name.into());
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Gets the run log path.
    pub fn artifact_path(&self) -> PathBuf {
        self.output_dir.join("logs").join("run.log")
    }

    /// Gets the directory copied assets land in.
    pub fn assets_dir(&self) -> PathBuf {
        self.output_dir.join("assets")
    }
}
