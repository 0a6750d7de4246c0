//! Embedding client: turns text into fixed-length vectors via an OpenAI-compatible
//! `/embeddings` endpoint.
//!
//! Screening code depends on the `Embedder` trait only; `EmbeddingClient` is the
//! production backend and tests substitute an in-memory stub.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid embedding client configuration: {0}")]
    Config(String),

    #[error("Embedding API returned {received} vectors for {expected} inputs")]
    CountMismatch { expected: usize, received: usize },

    #[error("Embedding dimension mismatch: expected {expected}, got {received}")]
    DimensionMismatch { expected: usize, received: usize },
}

/// Embedding capability consumed by the screening core.
///
/// Repeated calls on identical text must yield vectors whose cosine similarity is 1.0
/// within floating tolerance.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Settings for [`EmbeddingClient`], normally read from `Config`.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimensions: Option<usize>,
    pub timeout: Duration,
    pub max_retries: usize,
}

/// Async embeddings client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    max_retries: usize,
}

impl EmbeddingClient {
    pub fn new(settings: EmbeddingSettings) -> Result<Self, EmbeddingError> {
        if settings.api_key.trim().is_empty() {
            return Err(EmbeddingError::Config("missing embedding API key".to_string()));
        }
        if settings.model.trim().is_empty() {
            return Err(EmbeddingError::Config("missing embedding model name".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", settings.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| EmbeddingError::Config("invalid embedding API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", settings.base_url.trim_end_matches('/')),
            model: settings.model,
            dimensions: settings.dimensions,
            max_retries: settings.max_retries.max(1),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a batch of strings and returns one embedding per input, in input order.
    pub async fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.dimensions,
        };

        let mut attempt = 0usize;
        loop {
            let response = self.client.post(&self.endpoint).json(&request).send().await;

            let response = match response {
                Ok(r) => r,
                Err(err) => {
                    if is_retryable_error(&err) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!("Embedding request failed ({err}), retry {attempt}");
                        tokio::time::sleep(retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(err.into());
                }
            };

            let status = response.status();
            if status.is_success() {
                let mut parsed: EmbeddingResponse = response.json().await?;
                parsed.data.sort_by_key(|entry| entry.index);
                if parsed.data.len() != inputs.len() {
                    return Err(EmbeddingError::CountMismatch {
                        expected: inputs.len(),
                        received: parsed.data.len(),
                    });
                }
                debug!("Embedded {} inputs with {}", inputs.len(), self.model);
                return parsed
                    .data
                    .into_iter()
                    .map(|entry| self.check_dimensions(entry.embedding))
                    .collect();
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            if should_retry(status) && attempt + 1 < self.max_retries {
                attempt += 1;
                warn!("Embedding API returned {status}, retry {attempt}");
                tokio::time::sleep(retry_backoff(attempt)).await;
                continue;
            }
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
    }

    fn check_dimensions(&self, embedding: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
        match self.dimensions {
            Some(expected) if embedding.len() != expected => {
                Err(EmbeddingError::DimensionMismatch {
                    expected,
                    received: embedding.len(),
                })
            }
            _ => Ok(embedding),
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            received: 0,
        })
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_body() || err.is_request()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
