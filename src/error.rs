use generate::GenerateError;
use index::IndexError;
use semantic::SemanticError;
use thiserror::Error;

/// Everything that can stop a question from being answered.
#[derive(Debug, Clone, Error)]
pub enum RagError {
    /// The embedding model could not be reached or refused the request.
    #[error("embedding service error: {0}")]
    EmbeddingService(String),
    /// The vector index is missing, unreadable, or built for another model.
    #[error("{0}")]
    IndexUnavailable(IndexError),
    /// The chat model could not be reached or refused the request.
    #[error("generation service error: {0}")]
    GenerationService(String),
    /// The chat model answered with a body that does not match its schema.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RagError {
    /// Stable machine-readable name, used in API error bodies and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            RagError::EmbeddingService(_) => "embedding_service",
            RagError::IndexUnavailable(_) => "index_unavailable",
            RagError::GenerationService(_) => "generation_service",
            RagError::MalformedResponse(_) => "malformed_response",
            RagError::InvalidArgument(_) => "invalid_argument",
        }
    }
}

impl From<SemanticError> for RagError {
    fn from(err: SemanticError) -> Self {
        // Malformed embedding output is an embedding failure; MalformedResponse
        // is reserved for the chat model.
        RagError::EmbeddingService(err.to_string())
    }
}

impl From<IndexError> for RagError {
    fn from(err: IndexError) -> Self {
        RagError::IndexUnavailable(err)
    }
}

impl From<GenerateError> for RagError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::MalformedResponse(msg) => RagError::MalformedResponse(msg),
            GenerateError::Service(inner) => RagError::GenerationService(inner.to_string()),
            other => RagError::GenerationService(other.to_string()),
        }
    }
}
