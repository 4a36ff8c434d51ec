//! Error types for the memory subsystem.

use serde_json::Error as SerdeError;
use thiserror::Error;

/// Errors emitted by memory stores and their capabilities.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// A store option or configuration value was unrecognized or out of range.
    #[error("invalid memory configuration: {0}")]
    InvalidConfiguration(String),
    /// Conversation record or embedding failed validation.
    #[error("invalid memory record: {0}")]
    InvalidRecord(&'static str),
    /// Internal store state was found inconsistent. Not recoverable.
    #[error("memory invariant violated: {0}")]
    InvariantViolation(String),
    /// Strategy that summarizes was requested without a language model.
    #[error("language model not configured")]
    MissingModel,
    /// Strategy that indexes embeddings was requested without an embedder.
    #[error("embedder not configured")]
    MissingEmbedder,
    /// The language model capability reported a failure.
    #[error("language model error: {reason}")]
    Model {
        /// Human-readable reason describing the failure.
        reason: String,
    },
    /// The embedding capability reported a failure.
    #[error("embedding error: {reason}")]
    Embedding {
        /// Human-readable reason describing the failure.
        reason: String,
    },
    /// Serialization error while rendering structured output.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: SerdeError,
    },
}

impl MemoryError {
    /// Helper to construct configuration errors from string-like values.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Helper to construct language model errors from string-like values.
    #[must_use]
    pub fn model(reason: impl Into<String>) -> Self {
        Self::Model {
            reason: reason.into(),
        }
    }

    /// Helper to construct embedding errors from string-like values.
    #[must_use]
    pub fn embedding(reason: impl Into<String>) -> Self {
        Self::Embedding {
            reason: reason.into(),
        }
    }
}

/// Result type alias for memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;
