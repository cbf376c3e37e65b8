//! # querymax-embed
//!
//! Client side of the text embedding service used by the schema retrieval
//! index. Texts go out in batches over HTTP to an Ollama-compatible endpoint
//! and come back as `f32` vectors, one per input text, in input order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use querymax_embed::{EmbedConfig, EmbeddingProvider, HttpEmbeddingProvider};
//!
//! # async fn example() -> querymax_embed::Result<()> {
//! let provider = HttpEmbeddingProvider::new(EmbedConfig::default())?;
//!
//! let texts = vec!["Column users.city: type=TEXT".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//!
//! println!("Generated {} embeddings of dimension {}",
//!          result.len(), result.dimension);
//! # Ok(())
//! # }
//! ```
//!
//! ## Wire Contract
//!
//! ```text
//! POST {base_url}{endpoint}   {"model": "...", "input": ["text", ...]}
//! 200 OK                      {"embeddings": [[f32, ...], ...]}
//! ```
//!
//! Any non-2xx status, transport failure or body that does not match this
//! shape is an [`EmbedError`]. The client never retries; retry policy, if
//! wanted, belongs to the caller.
//!
//! ## Modules
//!
//! - [`config`]: Endpoint, model and batching configuration
//! - [`provider`]: The [`EmbeddingProvider`] trait and its HTTP implementation
//! - [`error`]: Error types and result handling

pub mod config;
pub mod error;
pub mod provider;

// Re-export main types for easy access
pub use config::{EmbedConfig, EmbedConfigBuilder};
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, HttpEmbeddingProvider};
