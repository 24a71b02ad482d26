//! Pipeline Error Types
//!
//! Every fallible pipeline operation returns `Result<T, PipelineError>`.
//! The core never logs user-facing messages; the calling layer decides
//! how each variant is presented.

use thiserror::Error;

/// Typed errors surfaced by the prediction pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Pixel buffer does not match the expected RGBA dimensions.
    #[error("invalid input shape: expected {expected} bytes, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },

    /// The on-device model asset could not be loaded.
    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    /// Offline inference was attempted before the model finished loading.
    #[error("model not loaded")]
    ModelNotReady,

    /// The backend returned an output of unexpected shape.
    #[error("malformed model output: expected {expected} values, got {actual}")]
    MalformedOutput { expected: usize, actual: usize },

    /// Remote service unreachable, timed out, or not yet ready (HTTP 503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Remote service returned an application error.
    #[error("service error ({status}): {body}")]
    ServiceError { status: u16, body: String },

    /// Persisted state was unreadable. Recovered internally by resetting
    /// to defaults; callers of `list`/`load` never observe this variant.
    #[error("persisted state corrupt: {0}")]
    PersistenceCorrupt(String),
}

impl PipelineError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}
