//! Experience executor - the main runner logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use super::config::RunnerConfig;
use super::experience::Experience;
use crate::artifact::{codec, RunRecord};
use crate::error::RunnerError;

/// What a finished run hands to the next stage.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Unique identifier for this run.
    pub run_id: String,
    pub experience: Experience,
    /// The record as flushed to `artifact_path`. Timestamps are already at
    /// the run log's microsecond precision.
    pub record: RunRecord,
    pub artifact_path: PathBuf,
    /// Number of assets copied before the run ended.
    pub assets_copied: usize,
}

/// Why asset processing stopped early.
#[derive(Debug)]
struct RunInterrupted {
    cause: String,
    assets_copied: usize,
}

/// Runs one experience and flushes its run log.
pub struct ExperienceRunner {
    /// Configuration for this run.
    config: RunnerConfig,
}

impl ExperienceRunner {
    /// Creates a new runner with the given configuration.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Runs the configured experience.
    ///
    /// Asset failures do not make this fail: they are recorded as ERROR
    /// events and the run is flushed as incomplete.
    ///
    /// # Errors
    ///
    /// `ExperienceNotFound` for a missing or empty experience directory (no
    /// output is written), or an I/O error flushing the run log.
    pub fn run(&self) -> Result<RunOutcome, RunnerError> {
        let experience = Experience::open(
            &self.config.experience_dir,
            self.config.experience_name.clone(),
        )?;
        let run_id = format!("run-{}", Uuid::new_v4());

        info!(
            "Starting run {} of experience '{}' from {}",
            run_id,
            experience.name,
            experience.path.display()
        );

        fs::create_dir_all(&self.config.output_dir).map_err(|e| RunnerError::OutputDir {
            path: self.config.output_dir.clone(),
            source: e,
        })?;

        // Compare resolved paths so an aliased output dir inside the
        // experience is still recognized and skipped.
        let output_root = fs::canonicalize(&self.config.output_dir).map_err(|e| {
            RunnerError::OutputDir {
                path: self.config.output_dir.clone(),
                source: e,
            }
        })?;
        let experience_root = fs::canonicalize(&experience.path)
            .map_err(|_| RunnerError::ExperienceNotFound(experience.path.clone()))?;

        let mut record = RunRecord::new();
        record.info(format!("starting experience '{}' ({})", experience.name, run_id));

        let start = Instant::now();
        let assets_copied = match self.process_assets(
            &experience_root,
            &output_root,
            &mut record,
            start,
        ) {
            Ok(count) => {
                record.info(format!(
                    "experience '{}' finished: {} assets in {:?}",
                    experience.name,
                    count,
                    start.elapsed()
                ));
                record.complete();
                count
            }
            Err(interrupted) => {
                error!("Run {} interrupted: {}", run_id, interrupted.cause);
                record.abort(interrupted.cause);
                interrupted.assets_copied
            }
        };

        let artifact_path = self.config.artifact_path();
        write_artifact(&record, &artifact_path)?;

        info!(
            "Run {} finished (completed={}, {} events) -> {}",
            run_id,
            record.completed,
            record.events.len(),
            artifact_path.display()
        );

        Ok(RunOutcome {
            run_id,
            experience,
            record,
            artifact_path,
            assets_copied,
        })
    }

    /// Copies every asset under `experience_root` into the output directory
    /// in sorted path order, skipping anything under `output_root`.
    ///
    /// Both roots must be canonical paths.
    fn process_assets(
        &self,
        experience_root: &Path,
        output_root: &Path,
        record: &mut RunRecord,
        start: Instant,
    ) -> Result<usize, RunInterrupted> {
        let assets_dir = output_root.join("assets");
        let mut copied = 0;

        let walker = WalkDir::new(experience_root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.path().starts_with(output_root));

        for entry in walker {
            let interrupt = |cause: String| RunInterrupted {
                cause,
                assets_copied: copied,
            };

            if let Some(budget) = self.config.time_budget {
                if start.elapsed() >= budget {
                    return Err(interrupt(format!(
                        "time budget of {:?} exceeded after {} assets",
                        budget, copied
                    )));
                }
            }

            let entry = entry.map_err(|e| interrupt(format!("failed to list assets: {}", e)))?;
            if entry.file_type().is_dir() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(experience_root)
                .unwrap_or(entry.path())
                .to_path_buf();
            let shown = relative.display().to_string();

            let bytes = fs::read(entry.path())
                .map_err(|e| interrupt(format!("failed to read asset '{}': {}", shown, e)))?;

            let target = assets_dir.join(&relative);
            copy_bytes(&bytes, &target)
                .map_err(|e| interrupt(format!("failed to copy asset '{}': {}", shown, e)))?;
            copied += 1;

            let digest = hex::encode(Sha256::digest(&bytes));
            debug!("Copied {} ({} bytes) to {}", shown, bytes.len(), target.display());
            record.info(format!(
                "copied asset '{}' ({} bytes, sha256={})",
                shown,
                bytes.len(),
                digest
            ));

            if is_json(&relative) {
                if let Err(e) = serde_json::from_slice::<serde_json::Value>(&bytes) {
                    warn!("Asset {} is not valid JSON: {}", shown, e);
                    record.warning(format!("asset '{}' is not valid JSON: {}", shown, e));
                }
            }
        }

        Ok(copied)
    }
}

/// Flushes a record to `path`, replacing any previous run log.
pub fn write_artifact(record: &RunRecord, path: &Path) -> Result<(), RunnerError> {
    let write_err = |e| RunnerError::ArtifactWrite {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, codec::render(record)).map_err(write_err)?;
    debug!("Saved run log to {}", path.display());
    Ok(())
}

fn copy_bytes(bytes: &[u8], target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, bytes)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
