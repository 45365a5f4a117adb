use thiserror::Error;

/// Failures while invoking a hosted model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    /// The runtime could not be constructed from its configuration.
    #[error("invalid runtime config: {0}")]
    InvalidConfig(String),
    /// The call exceeded the configured timeout.
    #[error("request to model '{model_id}' timed out")]
    Timeout { model_id: String },
    /// Connection, TLS, or body transfer failure.
    #[error("transport failure calling model '{model_id}': {message}")]
    Transport { model_id: String, message: String },
    /// The service answered with a non-success status.
    #[error("model '{model_id}' returned HTTP {status}: {body}")]
    Status {
        model_id: String,
        status: u16,
        body: String,
    },
}

impl InvokeError {
    /// HTTP status reported by the service, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            InvokeError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
