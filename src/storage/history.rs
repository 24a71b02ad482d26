//! History Store - bounded, append-only prediction log.
//!
//! The log is one JSON blob under a fixed file name, newest entry first,
//! trimmed to capacity on every write. Eviction is part of the write
//! contract, not a background sweep. Unreadable persisted data is treated
//! as an empty log.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::HISTORY_CAPACITY;
use crate::disease::Severity;
use crate::error::PipelineError;
use crate::pipeline::types::PredictionResult;

const HISTORY_FILE: &str = "history.json";

/// One saved prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Epoch milliseconds as a string; strictly monotonic across saves.
    pub id: String,
    pub disease: String,
    pub confidence: f32,
    pub crop: String,
    pub severity: Severity,
    pub treatment: String,
    pub image_path: String,
    /// RFC 3339 timestamp of the save.
    pub timestamp: String,
}

/// File-backed bounded prediction log.
///
/// Writes are read-modify-write; the internal mutex enforces the
/// single-writer discipline so concurrent saves cannot lose entries.
pub struct HistoryStore {
    file_path: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Store rooted at an explicit data directory.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .map_err(|e| PipelineError::PersistenceCorrupt(e.to_string()))?;

        Ok(Self {
            file_path: data_dir.join(HISTORY_FILE),
            write_lock: Mutex::new(()),
        })
    }

    /// Append a prediction to the log, evicting beyond capacity.
    pub fn save(
        &self,
        result: &PredictionResult,
        image_path: &str,
    ) -> Result<HistoryEntry, PipelineError> {
        let _guard = self.write_lock.lock();

        let mut entries = self.load_entries();
        let now = Utc::now();

        let entry = HistoryEntry {
            id: next_id(now.timestamp_millis(), entries.first()),
            disease: result.disease.clone(),
            confidence: result.confidence,
            crop: result.crop.clone(),
            severity: result.severity,
            treatment: result.treatment.clone(),
            image_path: image_path.to_string(),
            timestamp: now.to_rfc3339(),
        };

        entries.insert(0, entry.clone());
        entries.truncate(HISTORY_CAPACITY);

        self.persist(&entries)?;
        Ok(entry)
    }

    /// All saved predictions, newest first. Corruption yields an empty
    /// log rather than an error.
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.load_entries()
    }

    /// Remove one entry by id. Unknown ids are a no-op.
    pub fn delete(&self, id: &str) -> Result<(), PipelineError> {
        let _guard = self.write_lock.lock();

        let entries = self.load_entries();
        let filtered: Vec<HistoryEntry> =
            entries.iter().filter(|e| e.id != id).cloned().collect();

        if filtered.len() != entries.len() {
            self.persist(&filtered)?;
        }
        Ok(())
    }

    /// Drop the whole log.
    pub fn clear(&self) -> Result<(), PipelineError> {
        let _guard = self.write_lock.lock();

        if self.file_path.exists() {
            fs::remove_file(&self.file_path)
                .map_err(|e| PipelineError::PersistenceCorrupt(e.to_string()))?;
        }
        Ok(())
    }

    fn load_entries(&self) -> Vec<HistoryEntry> {
        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("history log unreadable ({e}), starting empty");
                Vec::new()
            }
        }
    }

    fn persist(&self, entries: &[HistoryEntry]) -> Result<(), PipelineError> {
        let content = serde_json::to_string(entries)
            .map_err(|e| PipelineError::PersistenceCorrupt(e.to_string()))?;
        fs::write(&self.file_path, content)
            .map_err(|e| PipelineError::PersistenceCorrupt(e.to_string()))
    }
}

/// Wall-clock milliseconds, bumped past the newest existing id so two
/// saves in the same millisecond still get distinct, ordered ids.
fn next_id(now_ms: i64, newest: Option<&HistoryEntry>) -> String {
    let floor = newest
        .and_then(|e| e.id.parse::<i64>().ok())
        .map(|prev| prev + 1)
        .unwrap_or(i64::MIN);
    now_ms.max(floor).to_string()
}
