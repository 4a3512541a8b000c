//! Semantic embedding collaborator.
//!
//! Embeddings are an enrichment, not a correctness requirement: every
//! provider failure degrades to "no embedding" at warning level and is never
//! surfaced as an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// Maximum input length in characters; longer text is truncated before the
/// provider call.
pub const EMBED_CHAR_CAP: usize = 8_000;

/// Embedding algorithm/contract version stored with each vector.
pub const EMBEDDING_VERSION: u32 = 1;

/// A fixed-length semantic vector with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    /// The embedding values.
    pub vector: Vec<f32>,
    /// Model identifier that produced the vector.
    pub model: String,
    /// Embedding contract version.
    pub version: u32,
}

/// Optional semantic-embedding collaborator.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text`, or `None` if the provider is unavailable or fails.
    async fn embed(&self, text: &str) -> Option<EmbeddingVector>;
}

/// The "not configured" provider: always `None`, no logging.
pub struct NoopEmbedding;

#[async_trait]
impl EmbeddingProvider for NoopEmbedding {
    async fn embed(&self, _text: &str) -> Option<EmbeddingVector> {
        None
    }
}

/// Configuration for the HTTP embedding provider.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Provider endpoint.
    pub endpoint: Url,
    /// Model identifier sent with each request.
    pub model: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
}

/// HTTP embedding provider speaking the common `{model, input}` ->
/// `{data: [{embedding}]}` contract.
pub struct HttpEmbeddingProvider {
    config: EmbeddingConfig,
    client: reqwest::Client,
}

impl HttpEmbeddingProvider {
    /// Create a provider with the given configuration.
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Option<EmbeddingVector> {
        let input = truncate_chars(text, EMBED_CHAR_CAP);

        let request = self
            .client
            .post(self.config.endpoint.clone())
            .json(&EmbeddingRequest {
                model: &self.config.model,
                input,
            });
        let request = match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Embedding request failed: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(status = %response.status(), "Embedding provider returned an error");
            return None;
        }

        let parsed: EmbeddingResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Embedding response decode failed: {e}");
                return None;
            }
        };
        let row = match parsed.data.into_iter().next() {
            Some(row) => row,
            None => {
                warn!("Embedding provider returned no vectors");
                return None;
            }
        };

        debug!(dims = row.embedding.len(), "embedding received");
        Some(EmbeddingVector {
            vector: row.embedding,
            model: self.config.model.clone(),
            version: EMBEDDING_VERSION,
        })
    }
}

/// Truncate to at most `cap` characters on a char boundary.
fn truncate_chars(text: &str, cap: usize) -> &str {
    match text.char_indices().nth(cap) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
