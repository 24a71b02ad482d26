//! Mode Orchestrator - uniform entry point over both backends.
//!
//! Two stable states, `Offline` and `Online`. Entering `Online` is gated
//! on a health probe; entering `Offline` is unconditional. Every
//! successful transition is persisted immediately. Dispatch in `analyze`
//! is an exhaustive match on the current mode — no silent fallback
//! between backends.

use parking_lot::RwLock;

use crate::disease::DiseaseDatabase;
use crate::error::PipelineError;
use crate::pipeline::offline::{EngineStatus, InferenceEngine};
use crate::pipeline::online::OnlineClient;
use crate::pipeline::preprocess::Preprocessor;
use crate::pipeline::ranker;
use crate::pipeline::types::{CapturedImage, InferenceMode, PredictionResult};
use crate::storage::ModeStore;

pub struct Orchestrator {
    mode: RwLock<InferenceMode>,
    engine: Box<dyn InferenceEngine>,
    preprocessor: Preprocessor,
    online: OnlineClient,
    db: DiseaseDatabase,
    mode_store: ModeStore,
    /// Serializes `set_mode` so a reader never observes a half-applied
    /// persisted value.
    transition_lock: tokio::sync::Mutex<()>,
}

impl Orchestrator {
    /// The initial mode comes from the persisted preference (default
    /// `Offline`); the tensor layout comes from the engine, fixed once.
    pub fn new(
        engine: Box<dyn InferenceEngine>,
        online: OnlineClient,
        db: DiseaseDatabase,
        mode_store: ModeStore,
    ) -> Self {
        let mode = mode_store.load();
        let preprocessor = Preprocessor::new(engine.input_layout());

        Self {
            mode: RwLock::new(mode),
            engine,
            preprocessor,
            online,
            db,
            mode_store,
            transition_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Currently selected inference mode.
    pub fn mode(&self) -> InferenceMode {
        *self.mode.read()
    }

    /// Load the on-device model (idempotent).
    pub fn load_model(&self) -> Result<(), PipelineError> {
        self.engine.load()
    }

    /// Release the on-device model (idempotent).
    pub fn release_model(&self) {
        self.engine.release();
    }

    /// On-device engine status for the caller's status surface.
    pub fn engine_status(&self) -> EngineStatus {
        self.engine.status()
    }

    /// Switch inference modes.
    ///
    /// Same-mode requests are a no-op. `Online` requires a successful
    /// health probe first; on failure the mode (and the persisted
    /// preference) stay unchanged and `ServiceUnavailable` is returned.
    pub async fn set_mode(&self, target: InferenceMode) -> Result<(), PipelineError> {
        let _guard = self.transition_lock.lock().await;

        if *self.mode.read() == target {
            return Ok(());
        }

        if target == InferenceMode::Online && !self.online.health_check().await {
            return Err(PipelineError::ServiceUnavailable(format!(
                "inference service not reachable at {}",
                self.online.base_url()
            )));
        }

        *self.mode.write() = target;
        self.mode_store.save(target)?;
        log::info!("inference mode switched to {target}");
        Ok(())
    }

    /// Analyze one captured image with the currently selected backend.
    ///
    /// The result may carry a confidence below
    /// [`crate::constants::CONFIDENCE_THRESHOLD`]; that is a valid result
    /// the caller may treat as inconclusive, not an error.
    pub async fn analyze(&self, image: &CapturedImage) -> Result<PredictionResult, PipelineError> {
        match self.mode() {
            InferenceMode::Offline => {
                if !self.engine.is_ready() {
                    return Err(PipelineError::ModelNotReady);
                }
                let tensor = self.preprocessor.preprocess(&image.rgba)?;
                let logits = self.engine.run(&tensor)?;
                ranker::diagnose(&logits, &self.db)
            }
            InferenceMode::Online => {
                let response = self
                    .online
                    .predict(image.encoded.clone(), file_name_of(&image.source))
                    .await?;
                Ok(response.into_prediction_result(&self.db))
            }
        }
    }
}

/// Last path segment of the opaque image reference, for the upload name.
fn file_name_of(source: &str) -> &str {
    source
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("leaf.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{IMG_SIZE, NUM_CLASSES};
    use crate::pipeline::online::OnlineConfig;
    use crate::pipeline::preprocess::{ChannelLayout, InputTensor};
    use parking_lot::RwLock as PlRwLock;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Engine that returns canned logits, standing in for the ONNX model.
    struct StubEngine {
        logits: Vec<f32>,
        ready: PlRwLock<bool>,
    }

    impl StubEngine {
        fn ready(logits: Vec<f32>) -> Self {
            Self {
                logits,
                ready: PlRwLock::new(true),
            }
        }

        fn unloaded() -> Self {
            Self {
                logits: vec![0.0; NUM_CLASSES],
                ready: PlRwLock::new(false),
            }
        }
    }

    impl InferenceEngine for StubEngine {
        fn load(&self) -> Result<(), PipelineError> {
            *self.ready.write() = true;
            Ok(())
        }

        fn run(&self, _tensor: &InputTensor) -> Result<Vec<f32>, PipelineError> {
            if !*self.ready.read() {
                return Err(PipelineError::ModelNotReady);
            }
            Ok(self.logits.clone())
        }

        fn is_ready(&self) -> bool {
            *self.ready.read()
        }

        fn release(&self) {
            *self.ready.write() = false;
        }

        fn status(&self) -> EngineStatus {
            EngineStatus {
                model_loaded: self.is_ready(),
                model_name: "stub".to_string(),
                inference_count: 0,
                avg_latency_ms: 0.0,
            }
        }
    }

    fn letter_db() -> DiseaseDatabase {
        let labels = (0..NUM_CLASSES)
            .map(|i| char::from(b'A' + i as u8).to_string())
            .collect();
        DiseaseDatabase::new(labels, Default::default())
    }

    fn captured() -> CapturedImage {
        CapturedImage {
            rgba: vec![0u8; IMG_SIZE * IMG_SIZE * 4],
            encoded: vec![0xFF, 0xD8, 0xFF],
            source: "/photos/leaf_001.jpg".to_string(),
        }
    }

    fn unreachable_client() -> OnlineClient {
        OnlineClient::new(OnlineConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 1,
        })
        .unwrap()
    }

    fn orchestrator_with(engine: Box<dyn InferenceEngine>, dir: &std::path::Path) -> Orchestrator {
        Orchestrator::new(
            engine,
            unreachable_client(),
            letter_db(),
            ModeStore::new(dir).unwrap(),
        )
    }

    /// Minimal HTTP listener answering every request with 200.
    async fn spawn_healthy_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = sock.read(&mut buf).await;
                    let _ = sock
                        .write_all(
                            b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        )
                        .await;
                });
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn offline_path_ranks_dominant_class() {
        let dir = tempdir().unwrap();
        let mut logits = vec![0.0f32; NUM_CLASSES];
        logits[3] = 12.0;
        let orch = orchestrator_with(Box::new(StubEngine::ready(logits)), dir.path());

        let result = orch.analyze(&captured()).await.unwrap();
        assert_eq!(result.disease, "D");
        assert!(result.confidence > 0.99);
        assert_eq!(result.top_k[0].label, result.disease);
        assert!(result.is_conclusive());
    }

    #[tokio::test]
    async fn offline_without_loaded_model_is_model_not_ready() {
        let dir = tempdir().unwrap();
        let orch = orchestrator_with(Box::new(StubEngine::unloaded()), dir.path());

        let err = orch.analyze(&captured()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ModelNotReady));
    }

    #[tokio::test]
    async fn set_mode_online_is_health_gated() {
        let dir = tempdir().unwrap();
        let orch = orchestrator_with(Box::new(StubEngine::unloaded()), dir.path());

        let err = orch.set_mode(InferenceMode::Online).await.unwrap_err();
        assert!(matches!(err, PipelineError::ServiceUnavailable(_)));
        assert_eq!(orch.mode(), InferenceMode::Offline);

        // The persisted preference is untouched too.
        let store = ModeStore::new(dir.path()).unwrap();
        assert_eq!(store.load(), InferenceMode::Offline);
    }

    #[tokio::test]
    async fn set_mode_online_transitions_and_persists_when_healthy() {
        let dir = tempdir().unwrap();
        let base_url = spawn_healthy_server().await;
        let online = OnlineClient::new(OnlineConfig {
            base_url,
            timeout_seconds: 5,
        })
        .unwrap();
        let orch = Orchestrator::new(
            Box::new(StubEngine::unloaded()),
            online,
            letter_db(),
            ModeStore::new(dir.path()).unwrap(),
        );

        orch.set_mode(InferenceMode::Online).await.unwrap();
        assert_eq!(orch.mode(), InferenceMode::Online);

        let store = ModeStore::new(dir.path()).unwrap();
        assert_eq!(store.load(), InferenceMode::Online);

        // Back to offline is unconditional.
        orch.set_mode(InferenceMode::Offline).await.unwrap();
        assert_eq!(orch.mode(), InferenceMode::Offline);
    }

    #[tokio::test]
    async fn set_mode_same_target_is_a_noop() {
        let dir = tempdir().unwrap();
        let orch = orchestrator_with(Box::new(StubEngine::unloaded()), dir.path());

        orch.set_mode(InferenceMode::Offline).await.unwrap();
        assert_eq!(orch.mode(), InferenceMode::Offline);
    }

    #[tokio::test]
    async fn initial_mode_comes_from_persisted_preference() {
        let dir = tempdir().unwrap();
        ModeStore::new(dir.path())
            .unwrap()
            .save(InferenceMode::Online)
            .unwrap();

        let orch = orchestrator_with(Box::new(StubEngine::unloaded()), dir.path());
        assert_eq!(orch.mode(), InferenceMode::Online);
    }

    #[tokio::test]
    async fn online_analyze_against_unreachable_service_is_unavailable() {
        let dir = tempdir().unwrap();
        ModeStore::new(dir.path())
            .unwrap()
            .save(InferenceMode::Online)
            .unwrap();
        let orch = orchestrator_with(Box::new(StubEngine::unloaded()), dir.path());

        let err = orch.analyze(&captured()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ServiceUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn upload_name_is_last_path_segment() {
        assert_eq!(file_name_of("/photos/leaf_001.jpg"), "leaf_001.jpg");
        assert_eq!(file_name_of(r"C:\photos\leaf.png"), "leaf.png");
        assert_eq!(file_name_of(""), "leaf.jpg");
    }
}
