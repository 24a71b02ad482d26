//! Central Configuration Constants
//!
//! Single source of truth for all pipeline configuration defaults.
//! To change the default API server, only edit this file.

/// Model input edge length (pixels). Inputs are 224x224 RGBA.
pub const IMG_SIZE: usize = 224;

/// Number of output classes of the classifier.
pub const NUM_CLASSES: usize = 15;

/// Number of ranked predictions returned alongside the primary one.
pub const TOP_K: usize = 5;

/// Minimum confidence for a prediction to be considered reliable.
/// Results below this are valid but should be treated as inconclusive.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Maximum number of entries kept in the local prediction history.
pub const HISTORY_CAPACITY: usize = 50;

/// ImageNet per-channel normalization mean (RGB).
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel normalization std (RGB).
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Prediction endpoint path on the remote inference service.
pub const PREDICT_PATH: &str = "/api/v1/predict";

/// Health probe path on the remote inference service.
pub const HEALTH_PATH: &str = "/api/v1/health";

/// Default remote inference service URL.
///
/// This is the fallback URL when no environment variable is set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default HTTP timeout for the remote service (seconds).
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get remote service URL from environment or use default
pub fn get_api_base_url() -> String {
    std::env::var("CROP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Get HTTP timeout from environment or use default
pub fn get_api_timeout_secs() -> u64 {
    std::env::var("CROP_API_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_API_TIMEOUT_SECS)
}
