//! Prediction Pipeline
//!
//! Image-to-tensor preprocessing, dual-mode inference dispatch, and
//! probability ranking behind a single `analyze` entry point.

pub mod offline;
pub mod online;
pub mod orchestrator;
pub mod preprocess;
pub mod ranker;
pub mod types;

pub use offline::{EngineStatus, InferenceEngine, OnnxEngine};
pub use online::{OnlineClient, OnlineConfig};
pub use orchestrator::Orchestrator;
pub use preprocess::{ChannelLayout, InputTensor, Preprocessor};
pub use types::{CapturedImage, ClassScore, InferenceMode, PredictionResult};
