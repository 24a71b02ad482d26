//! Mode Preference Store
//!
//! Persists the selected inference mode as a single value under a fixed
//! file name. Unreadable or unrecognized content degrades to the default
//! mode instead of failing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::pipeline::types::InferenceMode;

const MODE_FILE: &str = "inference_mode";

/// File-backed preference for the current inference mode.
pub struct ModeStore {
    file_path: PathBuf,
}

impl ModeStore {
    /// Store rooted at an explicit data directory.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .map_err(|e| PipelineError::PersistenceCorrupt(e.to_string()))?;

        Ok(Self {
            file_path: data_dir.join(MODE_FILE),
        })
    }

    /// Load the persisted mode. Missing file or garbage content yields
    /// the default (`Offline`); this never fails.
    pub fn load(&self) -> InferenceMode {
        match fs::read_to_string(&self.file_path) {
            Ok(content) => InferenceMode::from_persisted(&content),
            Err(_) => InferenceMode::Offline,
        }
    }

    /// Persist a mode. Called on every successful transition.
    pub fn save(&self, mode: InferenceMode) -> Result<(), PipelineError> {
        fs::write(&self.file_path, mode.as_str())
            .map_err(|e| PipelineError::PersistenceCorrupt(e.to_string()))
    }
}
