//! src/services/vision_service.rs
//!
//! The vision gateway: label detection for a stored image, addressed by its
//! public URI. `HttpVision` speaks the Google Vision `images:annotate` wire
//! shape over reqwest; `FakeVision` is a scripted stand-in for tests so no
//! test ever touches the network.

use crate::models::label::LabelAnnotation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision api key is not configured")]
    MissingApiKey,
    #[error("vision request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("vision endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("vision api reported an error: {0}")]
    Api(String),
}

pub type VisionResult<T> = Result<T, VisionError>;

/// How many labels to request per image. The classifier only needs the
/// first match, but a handful of candidates makes the landing page's label
/// list worth showing.
const LABEL_DETECTION_MAX_RESULTS: u32 = 10;

/// Label detection over a stored image's URI.
#[async_trait]
pub trait VisionGateway: Send + Sync {
    /// Detect content labels for the image at `image_uri`, ordered by
    /// relevance. An error payload embedded in an otherwise successful
    /// response surfaces as `VisionError::Api`.
    async fn detect_labels(&self, image_uri: &str) -> VisionResult<Vec<LabelAnnotation>>;
}

/// Gateway backed by an annotate endpoint in the Google Vision wire shape.
pub struct HttpVision {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpVision {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint,
            api_key,
            client,
        }
    }
}

#[async_trait]
impl VisionGateway for HttpVision {
    async fn detect_labels(&self, image_uri: &str) -> VisionResult<Vec<LabelAnnotation>> {
        let key = self.api_key.as_deref().ok_or(VisionError::MissingApiKey)?;
        let body = AnnotateRequest::label_detection(image_uri);

        // One attempt, no retries: a slow or failing gateway fails this
        // request and the caller reports it.
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VisionError::Status(response.status()));
        }

        let decoded: AnnotateResponse = response.json().await?;
        let first = decoded.responses.into_iter().next().unwrap_or_default();
        if let Some(error) = first.error {
            if !error.message.is_empty() {
                return Err(VisionError::Api(error.message));
            }
        }
        Ok(first.label_annotations)
    }
}

/// Scripted gateway for tests: returns the configured labels or API error
/// and counts how often it was called.
pub struct FakeVision {
    pub labels: Mutex<Vec<LabelAnnotation>>,
    pub api_error: Mutex<Option<String>>,
    pub calls: AtomicU64,
}

impl FakeVision {
    pub fn with_labels(descriptions: &[&str]) -> Self {
        let labels = descriptions
            .iter()
            .map(|d| LabelAnnotation {
                description: (*d).to_string(),
                score: 0.9,
            })
            .collect();
        Self {
            labels: Mutex::new(labels),
            api_error: Mutex::new(None),
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_api_error(message: &str) -> Self {
        Self {
            labels: Mutex::new(Vec::new()),
            api_error: Mutex::new(Some(message.to_string())),
            calls: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl VisionGateway for FakeVision {
    async fn detect_labels(&self, _image_uri: &str) -> VisionResult<Vec<LabelAnnotation>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(message) = self.api_error.lock().await.clone() {
            return Err(VisionError::Api(message));
        }
        Ok(self.labels.lock().await.clone())
    }
}

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateRequestEntry>,
}

impl AnnotateRequest {
    fn label_detection(image_uri: &str) -> Self {
        Self {
            requests: vec![AnnotateRequestEntry {
                image: RequestImage {
                    source: RequestImageSource {
                        image_uri: image_uri.to_string(),
                    },
                },
                features: vec![RequestFeature {
                    kind: "LABEL_DETECTION",
                    max_results: LABEL_DETECTION_MAX_RESULTS,
                }],
            }],
        }
    }
}

#[derive(Serialize)]
struct AnnotateRequestEntry {
    image: RequestImage,
    features: Vec<RequestFeature>,
}

#[derive(Serialize)]
struct RequestImage {
    source: RequestImageSource,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestImageSource {
    image_uri: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestFeature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Deserialize, Default)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResponseEntry>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AnnotateResponseEntry {
    #[serde(default)]
    label_annotations: Vec<LabelAnnotation>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}
