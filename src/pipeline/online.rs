//! Online Inference Backend - remote prediction service client.
//!
//! Forwards the original encoded image as a multipart upload; the tensor
//! preprocessor is never involved on this path. The response schema is
//! strict — any missing required field fails closed as `ServiceError`.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::constants::{self, HEALTH_PATH, PREDICT_PATH};
use crate::disease::{DiseaseDatabase, Severity};
use crate::error::PipelineError;
use crate::pipeline::types::{ClassScore, PredictionResult};

/// Remote service configuration.
#[derive(Debug, Clone)]
pub struct OnlineConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for OnlineConfig {
    fn default() -> Self {
        Self {
            base_url: constants::get_api_base_url(),
            timeout_seconds: constants::get_api_timeout_secs(),
        }
    }
}

/// One entry of the server's ranked prediction list.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTopK {
    pub class_name: String,
    pub confidence: f32,
}

/// Full prediction response from `POST /api/v1/predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPredictionResponse {
    pub success: bool,
    pub prediction: String,
    pub confidence: f32,
    pub crop: String,
    pub severity: String,
    pub treatment: String,
    pub top_k: Vec<ApiTopK>,
}

impl ApiPredictionResponse {
    /// Map the wire shape into the pipeline's `PredictionResult`.
    ///
    /// The server sends no symptoms/prevention detail, so those come from
    /// the local disease table; a curated local severity also wins over the
    /// server's free-form string.
    pub fn into_prediction_result(self, db: &DiseaseDatabase) -> PredictionResult {
        let local = db.lookup(&self.prediction);

        let severity = local
            .map(|rec| rec.severity)
            .or_else(|| Severity::parse_lenient(&self.severity))
            .unwrap_or(Severity::None);

        let top_k = self
            .top_k
            .into_iter()
            .map(|item| ClassScore {
                label: item.class_name,
                confidence: item.confidence,
            })
            .collect();

        PredictionResult {
            crop: self.crop,
            severity,
            treatment: self.treatment,
            symptoms: local.map(|rec| rec.symptoms.clone()).unwrap_or_default(),
            prevention: local.map(|rec| rec.prevention.clone()).unwrap_or_default(),
            disease: self.prediction,
            confidence: self.confidence,
            top_k,
        }
    }
}

/// HTTP client for the remote inference service.
pub struct OnlineClient {
    config: OnlineConfig,
    http_client: reqwest::Client,
}

impl OnlineClient {
    pub fn new(config: OnlineConfig) -> Result<Self, PipelineError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PipelineError::ServiceUnavailable(format!("http client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Upload an encoded image and parse the prediction response.
    pub async fn predict(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<ApiPredictionResponse, PipelineError> {
        let url = format!("{}{}", self.config.base_url, PREDICT_PATH);

        let part = Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))
            .map_err(|e| PipelineError::ServiceUnavailable(format!("multipart: {e}")))?;
        let form = Form::new().part("file", part);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        if status == 503 {
            return Err(PipelineError::ServiceUnavailable(
                "service reachable but model not loaded".to_string(),
            ));
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::ServiceError {
                status,
                body: excerpt(&body),
            });
        }

        let body: ApiPredictionResponse =
            response
                .json()
                .await
                .map_err(|e| PipelineError::ServiceError {
                    status,
                    body: format!("invalid response body: {e}"),
                })?;

        if !body.success {
            return Err(PipelineError::ServiceError {
                status,
                body: "service reported an unsuccessful prediction".to_string(),
            });
        }

        Ok(body)
    }

    /// Liveness probe. Any network failure or non-2xx status is `false`;
    /// never errors.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}{}", self.config.base_url, HEALTH_PATH);

        match self.http_client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::debug!("health check failed: {e}");
                false
            }
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> PipelineError {
    if e.is_timeout() {
        PipelineError::ServiceUnavailable("request timed out".to_string())
    } else {
        PipelineError::ServiceUnavailable(e.to_string())
    }
}

fn mime_for(file_name: &str) -> &'static str {
    if file_name.to_ascii_lowercase().ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

/// Body excerpt carried in `ServiceError` for diagnostics.
fn excerpt(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}
