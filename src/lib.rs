//! Crop Disease Diagnosis - Core Prediction Pipeline
//!
//! Diagnoses crop leaf diseases from a captured photo, either on-device
//! (ONNX Runtime) or via a remote inference service, and keeps a bounded
//! local history of completed predictions.
//!
//! The crate is the engine only: it accepts decoded RGBA pixels (or the
//! original encoded image for the online path) from an external capture
//! layer and returns typed results for an external presentation layer.
//! Camera control, permissions, and UI state live outside.
//!
//! ```no_run
//! use crop_disease_core::disease::DiseaseDatabase;
//! use crop_disease_core::pipeline::{OnlineClient, OnlineConfig, OnnxEngine, Orchestrator};
//! use crop_disease_core::storage::{default_data_dir, HistoryStore, ModeStore};
//!
//! # async fn run() -> Result<(), crop_disease_core::PipelineError> {
//! let data_dir = default_data_dir();
//! let orchestrator = Orchestrator::new(
//!     Box::new(OnnxEngine::new("crop_disease_classifier.onnx")),
//!     OnlineClient::new(OnlineConfig::default())?,
//!     DiseaseDatabase::embedded().clone(),
//!     ModeStore::new(&data_dir)?,
//! );
//! orchestrator.load_model()?;
//!
//! # let image: crop_disease_core::CapturedImage = todo!();
//! let result = orchestrator.analyze(&image).await?;
//! let history = HistoryStore::new(&data_dir)?;
//! history.save(&result, &image.source)?;
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod disease;
pub mod error;
pub mod pipeline;
pub mod storage;

pub use error::PipelineError;
pub use pipeline::{
    CapturedImage, ClassScore, InferenceMode, OnnxEngine, Orchestrator, PredictionResult,
};
pub use storage::{HistoryEntry, HistoryStore};
