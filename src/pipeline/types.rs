//! Shared pipeline data structures.

use serde::{Deserialize, Serialize};

use crate::disease::Severity;

/// Which inference backend the orchestrator dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    #[default]
    Offline,
    Online,
}

impl InferenceMode {
    /// Persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Online => "online",
        }
    }

    /// Parse a persisted value; anything unrecognized falls back to the
    /// default (`Offline`).
    pub fn from_persisted(s: &str) -> Self {
        match s.trim() {
            "online" => Self::Online,
            "offline" => Self::Offline,
            other => {
                if !other.is_empty() {
                    log::warn!("unrecognized persisted mode {other:?}, defaulting to offline");
                }
                Self::Offline
            }
        }
    }
}

impl std::fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One class prediction with its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub label: String,
    pub confidence: f32,
}

/// Complete diagnosis for one analyzed image.
///
/// Created once per successful `analyze` call and immutable afterwards;
/// owned by the caller until handed to the history store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub disease: String,
    pub confidence: f32,
    pub crop: String,
    pub severity: Severity,
    pub treatment: String,
    pub symptoms: Vec<String>,
    pub prevention: Vec<String>,
    pub top_k: Vec<ClassScore>,
}

impl PredictionResult {
    /// Whether the confidence clears the fixed reliability threshold.
    /// Below-threshold results are still valid; the presentation layer
    /// decides whether to prompt a retry.
    pub fn is_conclusive(&self) -> bool {
        self.confidence >= crate::constants::CONFIDENCE_THRESHOLD
    }
}

/// One captured/selected image handed to the pipeline by the capture layer.
///
/// The capture layer decodes the still frame once and supplies both forms:
/// the offline path consumes `rgba` (224x224 RGBA), the online path forwards
/// `encoded` (the original JPEG/PNG bytes) untouched. `source` is an opaque
/// path/URI kept for history entries.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub rgba: Vec<u8>,
    pub encoded: Vec<u8>,
    pub source: String,
}
