use bedrock::InvokeError;
use thiserror::Error;

/// Errors surfaced by the embedding adapter.
#[derive(Debug, Clone, Error)]
pub enum SemanticError {
    /// The remote embedding call failed (transport, timeout, or non-2xx).
    #[error("embedding service error: {0}")]
    Service(#[from] InvokeError),
    /// The service answered, but not with `{"embedding": [..]}`.
    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
    /// The configured tokenizer could not be loaded.
    #[error("tokenizer unavailable: {0}")]
    Tokenizer(String),
    /// The request body could not be serialized.
    #[error("failed to encode embedding request: {0}")]
    Encode(String),
}
