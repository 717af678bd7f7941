//! Error types for the `docqa-rag` crate.

use std::fmt;

use thiserror::Error;

/// The remote call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamStage {
    Embedding,
    Completion,
}

impl fmt::Display for UpstreamStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamStage::Embedding => f.write_str("embedding"),
            UpstreamStage::Completion => f.write_str("completion"),
        }
    }
}

/// Errors that can occur while building or querying the answer pipeline.
///
/// Callers branch on the variant: configuration errors are fatal at startup,
/// upstream errors are scoped to one request, and retrieval errors signal a
/// broken index invariant.
#[derive(Debug, Error)]
pub enum RagError {
    /// Missing credential, missing or empty knowledge file, invalid settings,
    /// or a pipeline used before (or initialized after) `initialize()`.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An embedding or completion provider failed or returned an unusable response.
    #[error("Upstream error during {stage} ({provider}): {message}")]
    UpstreamError {
        /// Which remote call failed.
        stage: UpstreamStage,
        /// The provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index could not serve a search (e.g. empty index).
    #[error("Retrieval error: {0}")]
    RetrievalError(String),
}

impl RagError {
    pub fn upstream(
        stage: UpstreamStage,
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RagError::UpstreamError { stage, provider: provider.into(), message: message.into() }
    }

    /// Short category name, suitable for a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::ConfigError(_) => "configuration",
            RagError::UpstreamError { .. } => "upstream",
            RagError::RetrievalError(_) => "retrieval",
        }
    }

    /// The failing remote call, for upstream errors.
    pub fn stage(&self) -> Option<UpstreamStage> {
        match self {
            RagError::UpstreamError { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
