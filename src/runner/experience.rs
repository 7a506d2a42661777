//! The experience being run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::RunnerError;

/// A named scenario and the directory of its input assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub name: String,
    pub path: PathBuf,
}

impl Experience {
    /// Opens an experience directory.
    ///
    /// # Errors
    ///
    /// `ExperienceNotFound` if `path` is missing, is not a directory, cannot
    /// be listed, or holds no file at any depth.
    pub fn open(path: &Path, name: Option<String>) -> Result<Self, RunnerError> {
        let not_found = || RunnerError::ExperienceNotFound(path.to_path_buf());

        if !path.is_dir() {
            return Err(not_found());
        }
        fs::read_dir(path).map_err(|_| not_found())?;

        // Empty subdirectories alone do not make an experience.
        let has_asset = WalkDir::new(path)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .any(|entry| !entry.file_type().is_dir());
        if !has_asset {
            return Err(not_found());
        }

        let name = name.unwrap_or_else(|| {
            path.file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "experience".to_string())
        });

        Ok(Self {
            name,
            path: path.to_path_buf(),
        })
    }
}
