//! Embedding provider implementations

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Result of embedding generation
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text, in input order
    pub embeddings: Vec<Vec<f32>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result from a vector of embeddings.
    ///
    /// The dimension is automatically inferred from the first embedding vector.
    /// If the embeddings vector is empty, dimension defaults to 0.
    pub fn new(embeddings: Vec<Vec<f32>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Returns the number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Check the result against the embedding contract.
    ///
    /// There must be exactly one vector per input text and every vector must
    /// share the same, non-zero dimensionality.
    pub fn validate(&self, expected: usize) -> Result<()> {
        if self.embeddings.len() != expected {
            return Err(EmbedError::malformed(format!(
                "expected {expected} embeddings, got {}",
                self.embeddings.len()
            )));
        }
        if !self.embeddings.is_empty() && self.dimension == 0 {
            return Err(EmbedError::malformed("zero-dimensional embeddings"));
        }
        if let Some((i, ragged)) = self
            .embeddings
            .iter()
            .enumerate()
            .find(|(_, e)| e.len() != self.dimension)
        {
            return Err(EmbedError::malformed(format!(
                "embedding {i} has dimension {}, expected {}",
                ragged.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}

/// Trait for embedding providers that can generate embeddings from text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts (batch processing)
    ///
    /// Output order matches input order. Empty input yields an empty result.
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult>;

    /// Generate an embedding for a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let result = self.embed_texts(&[text.to_string()]).await?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::malformed("no embedding generated for text"))
    }

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding provider backed by an Ollama-compatible HTTP service.
///
/// Sends `{"model": ..., "input": [...]}` to the configured endpoint and
/// expects `{"embeddings": [[...], ...]}` back, in request order. Any non-2xx
/// status, transport failure or malformed body is a hard error.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    config: EmbedConfig,
    client: Client,
    url: String,
}

impl HttpEmbeddingProvider {
    /// Creates a provider after validating the configuration.
    pub fn new(config: EmbedConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder().timeout(config.timeout).build()?;
        let url = config.endpoint_url();

        tracing::info!(
            "Embedding client initialized for model {} at {}",
            config.model_name,
            url
        );

        Ok(Self {
            config,
            client,
            url,
        })
    }

    /// The configuration this provider was built from
    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        tracing::debug!("Requesting embeddings for batch of {} texts", batch.len());

        let request = EmbedRequest {
            model: &self.config.model_name,
            input: batch,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Embedding service returned error: {} - {}", status, body);
            return Err(EmbedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let parsed: EmbedResponse = serde_json::from_slice(&body)
            .map_err(|e| EmbedError::malformed(format!("undecodable body: {e}")))?;

        if parsed.embeddings.len() != batch.len() {
            return Err(EmbedError::malformed(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                parsed.embeddings.len()
            )));
        }

        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(vec![]));
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            all_embeddings.extend(self.embed_batch(batch).await?);
        }

        let result = EmbeddingResult::new(all_embeddings);
        result.validate(texts.len())?;

        tracing::debug!(
            "Generated {} embeddings of dimension {}",
            result.len(),
            result.dimension
        );
        Ok(result)
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}
