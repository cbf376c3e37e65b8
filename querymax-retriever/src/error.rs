//! Error taxonomy for the retrieval core

use querymax_embed::EmbedError;

/// Result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors surfaced by the retrieval core.
///
/// Every variant that wraps an underlying failure also records the name of
/// the operation that hit it, so callers can log and display the failure
/// without extra context. Nothing here is retried internally.
///
/// An empty corpus is not an error: retrieval against an empty index returns
/// no documents.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Schema read or persistence I/O failed
    #[error("{operation}: backing store unavailable: {source}")]
    StoreUnavailable {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The embedding collaborator was unreachable or answered with an error
    #[error("{operation}: embedding service unavailable: {source}")]
    EmbeddingUnavailable {
        operation: &'static str,
        #[source]
        source: EmbedError,
    },

    /// Query or document vectors do not match the index dimensionality
    #[error("index incompatible: expected dimension {expected}, got {actual}")]
    IndexIncompatible { expected: usize, actual: usize },

    /// Configuration could not be parsed
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl RetrievalError {
    /// Returns a closure mapping a store error into [`RetrievalError::StoreUnavailable`].
    ///
    /// Meant for `map_err`: `.map_err(RetrievalError::store("load_all"))?`.
    pub fn store(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::StoreUnavailable { operation, source }
    }

    /// Returns a closure mapping an embedding error into [`RetrievalError::EmbeddingUnavailable`].
    pub fn embedding(operation: &'static str) -> impl FnOnce(EmbedError) -> Self {
        move |source| Self::EmbeddingUnavailable { operation, source }
    }

    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Name of the operation that failed, when the error carries one
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::StoreUnavailable { operation, .. }
            | Self::EmbeddingUnavailable { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}
