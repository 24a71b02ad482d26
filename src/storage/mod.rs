//! Persisted State
//!
//! File-backed stores for the prediction history and the inference-mode
//! preference. Both survive process restarts and degrade gracefully on
//! corrupt data.

pub mod history;
pub mod prefs;

use std::path::PathBuf;

pub use history::{HistoryEntry, HistoryStore};
pub use prefs::ModeStore;

/// Default persistence directory, under the platform's local data dir.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("crop-disease")
}
