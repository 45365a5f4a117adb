use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use policyqa::GenerationResponse;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    /// Text of the first content block.
    pub answer: String,
    /// The model's response envelope, unmodified.
    pub response: GenerationResponse,
}

/// `POST /api/v1/answer`
///
/// ```json
/// {"question": "What is the baggage allowance?"}
/// ```
pub async fn answer(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> ServerResult<Json<AnswerResponse>> {
    let Json(request) =
        payload.map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
    if request.question.trim().is_empty() {
        return Err(ServerError::BadRequest("question must not be empty".into()));
    }

    let response = super::answer_question(&state, &request.question).await?;
    Ok(Json(AnswerResponse {
        answer: response.text().to_string(),
        response,
    }))
}
