//! Configuration for the embedding client

use crate::error::{EmbedError, Result};
use derive_builder::Builder;
use std::time::Duration;

/// Default address of a local Ollama-compatible embedding service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Default embedding model name.
pub const DEFAULT_MODEL: &str = "nomic-embed-text";

/// Default batch endpoint, relative to the base URL.
pub const DEFAULT_ENDPOINT: &str = "/api/embed";

/// Configuration for the HTTP embedding client
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct EmbedConfig {
    /// Base URL of the embedding service (scheme, host and port)
    #[builder(default = "DEFAULT_BASE_URL.to_string()")]
    pub base_url: String,
    /// Name of the embedding model to request
    #[builder(default = "DEFAULT_MODEL.to_string()")]
    pub model_name: String,
    /// Path of the batch embedding endpoint
    #[builder(default = "DEFAULT_ENDPOINT.to_string()")]
    pub endpoint: String,
    /// Maximum number of texts sent in one request
    #[builder(default = "32")]
    pub batch_size: usize,
    /// Per-request timeout enforced by the HTTP client
    #[builder(default = "Duration::from_secs(60)")]
    pub timeout: Duration,
}

impl EmbedConfig {
    /// Create a new embedding configuration using the builder
    pub fn builder() -> EmbedConfigBuilder {
        EmbedConfigBuilder::default()
    }

    /// Create a configuration for a service and model, keeping the other defaults
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    /// Set the batch size for embedding generation (builder style)
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set the request timeout (builder style)
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Set the endpoint path (builder style)
    pub fn with_endpoint<S: Into<String>>(self, endpoint: S) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..self
        }
    }

    /// Full URL of the batch embedding endpoint.
    ///
    /// Joins the base URL and endpoint with exactly one slash, so both
    /// `http://host:11434/` and `http://host:11434` work.
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    /// Validate the configuration before building a client
    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(EmbedError::invalid_config("model name must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(EmbedError::invalid_config("batch size must be at least 1"));
        }
        let url = self.endpoint_url();
        reqwest::Url::parse(&url)
            .map_err(|e| EmbedError::invalid_config(format!("invalid endpoint URL {url}: {e}")))?;

        tracing::debug!("Embedding config validated for {}", url);
        Ok(())
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            batch_size: 32,
            timeout: Duration::from_secs(60),
        }
    }
}
