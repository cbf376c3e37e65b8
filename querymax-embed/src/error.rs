//! Error types for the embedding client

/// Result type for embedding operations.
///
/// This is a convenience type alias that uses [`EmbedError`] as the error type.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Error type for all embedding operations.
///
/// Every failure mode of the remote embedding service maps onto one of these
/// variants. None of them is retried here; callers decide whether a failed
/// request is worth repeating.
///
/// # Error Categories
///
/// - **Configuration Errors**: Unusable base URL, endpoint or batch size
/// - **Transport Errors**: The request could not be sent or its body could not be read
/// - **Status Errors**: The service answered with a non-success status code
/// - **Response Errors**: The body was not the expected JSON shape
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Error when the client configuration is invalid
    #[error("Invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// Error while sending the request or reading the response body
    #[error("Embedding request failed: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    /// Error when the service answers with a non-2xx status
    #[error("Embedding service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Error when the response body does not match the embedding contract
    #[error("Malformed embedding response: {message}")]
    MalformedResponse { message: String },
}

impl EmbedError {
    /// Create an invalid configuration error with a custom message.
    ///
    /// # Arguments
    /// * `message` - A descriptive error message explaining what's wrong with the configuration
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a malformed response error with a custom message.
    ///
    /// Used when the body decodes but violates the contract, for example when
    /// the number of vectors differs from the number of input texts.
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}
