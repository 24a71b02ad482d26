//! Offline Inference Backend - ONNX Runtime integration.
//!
//! Wraps the bundled classifier behind the `InferenceEngine` trait so the
//! orchestrator (and tests) can swap the engine.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants::{IMG_SIZE, NUM_CLASSES};
use crate::error::PipelineError;
use crate::pipeline::preprocess::{ChannelLayout, InputTensor};

/// Engine status for the caller's status surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub model_name: String,
    pub inference_count: u64,
    pub avg_latency_ms: f32,
}

/// On-device classifier abstraction.
///
/// All methods take `&self`; implementations use interior locking. The
/// loaded handle is exclusively owned for the duration of one `run` —
/// callers must serialize concurrent runs.
pub trait InferenceEngine: Send + Sync {
    /// Load the model. Idempotent: repeated calls before `release`
    /// reuse the cached handle.
    fn load(&self) -> Result<(), PipelineError>;

    /// Forward pass. Fails with `ModelNotReady` before a successful load.
    fn run(&self, tensor: &InputTensor) -> Result<Vec<f32>, PipelineError>;

    /// Whether `run` can be called.
    fn is_ready(&self) -> bool;

    /// Drop the loaded handle. Safe to call repeatedly.
    fn release(&self);

    /// Tensor layout the model consumes.
    fn input_layout(&self) -> ChannelLayout {
        ChannelLayout::Chw
    }

    fn status(&self) -> EngineStatus;
}

/// Production engine backed by ONNX Runtime.
pub struct OnnxEngine {
    model_path: PathBuf,
    session: RwLock<Option<Session>>,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl OnnxEngine {
    pub fn new(model_path: impl AsRef<Path>) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            session: RwLock::new(None),
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl InferenceEngine for OnnxEngine {
    fn load(&self) -> Result<(), PipelineError> {
        if self.session.read().is_some() {
            return Ok(());
        }

        if !self.model_path.exists() {
            return Err(PipelineError::ModelLoadFailed(format!(
                "model not found: {}",
                self.model_path.display()
            )));
        }

        log::info!("Loading ONNX model from: {}", self.model_path.display());

        let session = Session::builder()
            .map_err(|e| PipelineError::ModelLoadFailed(format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| PipelineError::ModelLoadFailed(format!("optimization level: {e}")))?
            .commit_from_file(&self.model_path)
            .map_err(|e| PipelineError::ModelLoadFailed(e.to_string()))?;

        log::info!("ONNX model loaded successfully");

        *self.session.write() = Some(session);
        Ok(())
    }

    fn run(&self, tensor: &InputTensor) -> Result<Vec<f32>, PipelineError> {
        let start_time = std::time::Instant::now();

        let expected = 3 * IMG_SIZE * IMG_SIZE;
        if tensor.data.len() != expected {
            return Err(PipelineError::InvalidInputShape {
                expected,
                actual: tensor.data.len(),
            });
        }

        let mut session_guard = self.session.write();
        let session = session_guard.as_mut().ok_or(PipelineError::ModelNotReady)?;

        let input_array =
            Array4::<f32>::from_shape_vec((1, 3, IMG_SIZE, IMG_SIZE), tensor.data.clone())
                .map_err(|e| PipelineError::ModelLoadFailed(format!("input array: {e}")))?;

        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| PipelineError::ModelLoadFailed("no output defined".to_string()))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| PipelineError::ModelLoadFailed(format!("input tensor: {e}")))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| PipelineError::ModelLoadFailed(format!("inference failed: {e}")))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| PipelineError::MalformedOutput {
                expected: NUM_CLASSES,
                actual: 0,
            })?;

        // Non-f32 output means a model/version mismatch, not a load problem.
        let output_tensor =
            output
                .try_extract_tensor::<f32>()
                .map_err(|_| PipelineError::MalformedOutput {
                    expected: NUM_CLASSES,
                    actual: 0,
                })?;

        let logits = output_tensor.1;
        if logits.len() != NUM_CLASSES {
            return Err(PipelineError::MalformedOutput {
                expected: NUM_CLASSES,
                actual: logits.len(),
            });
        }

        let elapsed_us = start_time.elapsed().as_micros() as u64;
        self.latency_sum_us.fetch_add(elapsed_us, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Ok(logits.to_vec())
    }

    fn is_ready(&self) -> bool {
        self.session.read().is_some()
    }

    fn release(&self) {
        let mut session = self.session.write();
        if session.take().is_some() {
            log::info!("ONNX model released");
        }
    }

    fn status(&self) -> EngineStatus {
        let count = self.inference_count.load(Ordering::Relaxed);
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let avg = if count > 0 {
            (sum as f32 / count as f32) / 1000.0
        } else {
            0.0
        };

        EngineStatus {
            model_loaded: self.is_ready(),
            model_name: self.model_path.display().to_string(),
            inference_count: count,
            avg_latency_ms: avg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::preprocess::Preprocessor;

    #[test]
    fn load_missing_model_fails() {
        let engine = OnnxEngine::new("/nonexistent/model.onnx");
        let err = engine.load().unwrap_err();
        assert!(matches!(err, PipelineError::ModelLoadFailed(_)));
        assert!(!engine.is_ready());
    }

    #[test]
    fn run_before_load_is_model_not_ready() {
        let engine = OnnxEngine::new("/nonexistent/model.onnx");
        let tensor = Preprocessor::new(ChannelLayout::Chw)
            .preprocess(&vec![0u8; IMG_SIZE * IMG_SIZE * 4])
            .unwrap();

        let err = engine.run(&tensor).unwrap_err();
        assert!(matches!(err, PipelineError::ModelNotReady));
    }

    #[test]
    fn release_is_idempotent() {
        let engine = OnnxEngine::new("/nonexistent/model.onnx");
        engine.release();
        engine.release();
        assert!(!engine.is_ready());
    }

    #[test]
    fn status_reports_unloaded_engine() {
        let engine = OnnxEngine::new("model.onnx");
        let status = engine.status();
        assert!(!status.model_loaded);
        assert_eq!(status.inference_count, 0);
        assert_eq!(status.avg_latency_ms, 0.0);
    }
}
