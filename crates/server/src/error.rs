use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use policyqa::RagError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Answer(#[from] RagError),

    #[error("Metrics are disabled")]
    MetricsDisabled,

    #[error("Not found")]
    NotFound,
}

/// API error body: `{"error": {"code", "message"}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound | ServerError::MetricsDisabled => StatusCode::NOT_FOUND,
            ServerError::Answer(err) => match err {
                RagError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                RagError::IndexUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                RagError::EmbeddingService(_)
                | RagError::GenerationService(_)
                | RagError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "bad_request",
            ServerError::MetricsDisabled => "metrics_disabled",
            ServerError::NotFound => "not_found",
            ServerError::Answer(err) => err.code(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
