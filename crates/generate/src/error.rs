use bedrock::InvokeError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    #[error("generation service error: {0}")]
    Service(#[from] InvokeError),
    /// The model answered, but not in the messages-v1 response shape.
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
    #[error("failed to encode generation request: {0}")]
    Encode(String),
}
