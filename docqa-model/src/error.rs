//! Error types for the `docqa-model` crate.

use thiserror::Error;

/// Errors that can occur when calling a chat model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model client is misconfigured (e.g. empty API key).
    #[error("Model configuration error: {0}")]
    Config(String),

    /// The request never produced an HTTP response (network, timeout, TLS).
    #[error("Model request failed ({provider}): {message}")]
    Request {
        /// The provider that was being called.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider answered with a non-success status.
    #[error("Model API error ({provider}) {status}: {message}")]
    Api {
        /// The provider that produced the error.
        provider: String,
        /// HTTP status code returned by the provider.
        status: u16,
        /// The provider's error message, if one could be parsed.
        message: String,
    },

    /// The provider answered, but the body could not be understood.
    #[error("Invalid model response ({provider}): {message}")]
    InvalidResponse {
        /// The provider that produced the response.
        provider: String,
        /// A description of what was wrong.
        message: String,
    },

    /// A scripted mock ran out of responses or was told to fail.
    #[error("Mock model error: {0}")]
    Mock(String),
}

impl ModelError {
    /// Whether the provider rejected the call for rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ModelError::Api { status: 429, .. })
    }
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
