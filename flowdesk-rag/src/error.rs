//! Error types for the `flowdesk-rag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The caller supplied invalid parameters.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The language model call failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The language model that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A read was attempted before any document was indexed.
    #[error("No documents added to the vector index")]
    EmptyIndex,

    /// No language model or embedding credential is available.
    #[error("Not configured: {0}")]
    NotConfigured(String),
}

impl RagError {
    /// Returns `true` when the error was caused by the caller's input rather
    /// than an upstream service or missing setup.
    ///
    /// A request layer maps these to a 4xx response and everything else to 5xx.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, RagError::ConfigError(_))
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        RagError::ConfigError(message.into())
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_provider_and_message() {
        let err = RagError::EmbeddingError {
            provider: "OpenAI".into(),
            message: "quota exceeded".into(),
        };
        assert_eq!(err.to_string(), "Embedding error (OpenAI): quota exceeded");
    }

    #[test]
    fn only_config_errors_are_caller_errors() {
        assert!(RagError::config("content must not be empty").is_caller_error());
        assert!(!RagError::EmptyIndex.is_caller_error());
        assert!(!RagError::NotConfigured("no key".into()).is_caller_error());
        assert!(
            !RagError::GenerationError { provider: "mock".into(), message: "boom".into() }
                .is_caller_error()
        );
    }
}
