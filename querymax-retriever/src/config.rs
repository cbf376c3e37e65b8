//! Runtime configuration for the retrieval service.
//!
//! Settings come from defaults, then `QM_*` environment variables, then
//! command-line flags (applied by the binary on top of [`RetrievalConfig::from_env`]).

use crate::error::{Result, RetrievalError};
use querymax_embed::EmbedConfig;
use std::path::PathBuf;

/// Default location of the backing SQLite file
pub const DEFAULT_DB_PATH: &str = "database.db";

/// Default number of documents returned by `retrieve`
pub const DEFAULT_TOP_K: usize = 6;

pub const ENV_DB_PATH: &str = "QM_DB_PATH";
pub const ENV_OLLAMA_URL: &str = "QM_OLLAMA_URL";
pub const ENV_EMBED_MODEL: &str = "QM_EMBED_MODEL";
pub const ENV_TOP_K: &str = "QM_TOPK";

/// Configuration of a [`crate::retrieval::RetrievalService`]
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Backing SQLite database holding both the user schema and the index tables
    pub db_path: PathBuf,
    /// Result count used when `retrieve` is called without an explicit `k`
    pub top_k: usize,
    /// Embedding collaborator settings
    pub embed: EmbedConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            top_k: DEFAULT_TOP_K,
            embed: EmbedConfig::default(),
        }
    }
}

impl RetrievalConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Unset variables keep their defaults. An unparsable `QM_TOPK` is an
    /// [`RetrievalError::InvalidConfig`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(url) = lookup(ENV_OLLAMA_URL) {
            config.embed.base_url = url;
        }
        if let Some(model) = lookup(ENV_EMBED_MODEL) {
            config.embed.model_name = model;
        }
        if let Some(top_k) = lookup(ENV_TOP_K) {
            config.top_k = top_k.trim().parse().map_err(|_| {
                RetrievalError::invalid_config(format!("{ENV_TOP_K} must be a non-negative integer, got {top_k:?}"))
            })?;
        }

        Ok(config)
    }

    pub fn with_db_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_embed_config(mut self, embed: EmbedConfig) -> Self {
        self.embed = embed;
        self
    }
}
