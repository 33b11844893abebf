//! Embedding provider trait and implementations.
//!
//! - `OpenAiEmbedding` calls a hosted embeddings endpoint over HTTP. This is
//!   the production backend.
//! - `MockEmbedding` provides deterministic hash-based vectors for testing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sextant_core::config::EmbeddingConfig;
use sextant_core::error::{Result, SextantError};

use crate::http::{ensure_success, transport_error};

/// Converts a query string into a fixed-dimension vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single query.
    ///
    /// Fails with `InvalidInput` for empty or whitespace-only text and with
    /// `Provider` for any upstream failure. There are no retries.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimensionality of the produced vectors.
    fn dimensions(&self) -> usize;
}

fn reject_blank(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(SextantError::InvalidInput(
            "Query cannot be empty".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// OpenAiEmbedding - hosted embeddings endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
    encoding_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedding provider backed by an OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedding {
    /// Build a provider from configuration. `timeout` bounds every request.
    pub fn new(config: &EmbeddingConfig, timeout: Duration) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(SextantError::Config(
                "embedding API key cannot be empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SextantError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        reject_blank(text)?;

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
            encoding_format: "float",
        };

        let resp = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("Failed to create embedding", e))?;
        let resp = ensure_success(resp, "Embedding request").await?;

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| transport_error("Malformed embedding response", e))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                SextantError::Provider("Embedding response contained no data".to_string())
            })?;

        if embedding.len() != self.dimensions {
            return Err(SextantError::Provider(format!(
                "Embedding has {} dimensions, expected {}",
                embedding.len(),
                self.dimensions
            )));
        }

        debug!(model = %self.model, dimensions = embedding.len(), "Query embedded");
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Mock embedding provider returning deterministic vectors.
///
/// By default the output is derived from a hash of the input text, so
/// identical inputs always produce identical outputs. A fixed vector or a
/// forced failure can be configured for pipeline tests, and every call is
/// counted.
#[derive(Debug, Clone)]
pub struct MockEmbedding {
    dimensions: usize,
    fixed: Option<Vec<f32>>,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbedding {
    /// Hash-based mock producing 768-dimensional unit vectors.
    pub fn new() -> Self {
        Self::with_dimensions(768)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            fixed: None,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always return `vector`, whatever the query.
    pub fn fixed(vector: Vec<f32>) -> Self {
        Self {
            dimensions: vector.len(),
            fixed: Some(vector),
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every non-blank query with a `Provider` error.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Number of `embed_query` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedding {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        reject_blank(text)?;
        if let Some(reason) = &self.failure {
            return Err(SextantError::Provider(format!(
                "Failed to create embedding: {}",
                reason
            )));
        }
        if let Some(vector) = &self.fixed {
            return Ok(vector.clone());
        }
        Ok(self.hash_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
