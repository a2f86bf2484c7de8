// Detection Client
// Submits validated uploads to the YOLO detection backend, or to a local
// simulated backend when no server is available

use rand::Rng;
use reqwest::multipart;
use reqwest::Client;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error};

use crate::models::{Detection, DetectionResult, ImageDimensions, UploadFile};
use crate::services::config::CleanSightConfig;
use crate::services::validator::validate;

#[derive(Error, Debug)]
pub enum DetectError {
    /// Upload rejected before any network activity; the message joins every
    /// validation violation.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Detection API error: status {status}")]
    Api { status: u16 },
    #[error("Unexpected response body: {0}")]
    Json(String),
}

/// One backend call per invocation, no retry. Implementations are selected by
/// the composition root and swap without touching caller code.
pub trait DetectionBackend {
    fn detect(
        &self,
        file: &UploadFile,
    ) -> impl std::future::Future<Output = Result<DetectionResult, DetectError>> + Send;
}

/// Real backend: one multipart POST to `{base_url}/api/detect`.
///
/// No client-side timeout is set; a hung call blocks its own submission and
/// nothing else (concurrent submissions proceed independently).
pub struct HttpDetectionClient {
    client: Client,
    api_base_url: String,
}

impl HttpDetectionClient {
    pub fn new(config: &CleanSightConfig) -> Self {
        Self {
            client: Client::new(),
            api_base_url: config.api_base_url.clone(),
        }
    }
}

impl DetectionBackend for HttpDetectionClient {
    async fn detect(&self, file: &UploadFile) -> Result<DetectionResult, DetectError> {
        let part = multipart::Part::bytes(file.data.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = multipart::Form::new().part("file", part);
        let url = format!("{}/api/detect", self.api_base_url);

        let start = Instant::now();
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectError::Api {
                status: status.as_u16(),
            });
        }

        // The response is trusted verbatim as the DetectionResult shape.
        let result: DetectionResult = response
            .json()
            .await
            .map_err(|e| DetectError::Json(e.to_string()))?;

        debug!(
            latency_ms = start.elapsed().as_millis() as i64,
            detections = result.detections.len(),
            "detect.completed"
        );
        Ok(result)
    }
}

/// Simulated backend for environments without a live detection server.
///
/// Returns the fixed three-detection scene with probability 0.7, otherwise a
/// clean (empty) result, after an artificial delay.
pub struct SimulatedDetectionClient {
    delay: Duration,
}

impl Default for SimulatedDetectionClient {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
        }
    }
}

impl SimulatedDetectionClient {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    fn sample_detections() -> Vec<Detection> {
        vec![
            Detection {
                id: 1,
                r#type: "plastic_bottle".to_string(),
                confidence: 0.92,
                bbox: [120.0, 80.0, 180.0, 220.0],
            },
            Detection {
                id: 2,
                r#type: "cigarette_butt".to_string(),
                confidence: 0.85,
                bbox: [300.0, 150.0, 320.0, 180.0],
            },
            Detection {
                id: 3,
                r#type: "food_wrapper".to_string(),
                confidence: 0.78,
                bbox: [200.0, 300.0, 280.0, 340.0],
            },
        ]
    }
}

impl DetectionBackend for SimulatedDetectionClient {
    async fn detect(&self, _file: &UploadFile) -> Result<DetectionResult, DetectError> {
        tokio::time::sleep(self.delay).await;

        let (detections, processing_time) = {
            let mut rng = rand::thread_rng();
            let detections = if rng.gen::<f64>() < 0.7 {
                Self::sample_detections()
            } else {
                Vec::new() // clean scene
            };
            (detections, 1.5 + rng.gen::<f64>() * 2.0)
        };

        Ok(DetectionResult {
            success: true,
            detections,
            processing_time,
            image_dimensions: ImageDimensions {
                width: 800,
                height: 600,
            },
        })
    }
}

/// The submission pipeline: validation gate in front of a backend.
pub struct DetectionService<B: DetectionBackend> {
    config: CleanSightConfig,
    backend: B,
}

impl<B: DetectionBackend> DetectionService<B> {
    pub fn new(config: CleanSightConfig, backend: B) -> Self {
        Self { config, backend }
    }

    /// Validate, then submit. An invalid upload fails without any backend
    /// call; backend failures are logged once and propagated.
    pub async fn submit(&self, file: &UploadFile) -> Result<DetectionResult, DetectError> {
        let validation = validate(Some(file), &self.config);
        if !validation.is_valid {
            return Err(DetectError::Validation(validation.errors));
        }

        match self.backend.detect(file).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(file = %file.file_name, error = %e, "detection failed");
                Err(e)
            }
        }
    }
}
