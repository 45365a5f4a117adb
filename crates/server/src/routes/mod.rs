//! HTTP handlers
//!
//! - `form`: the HTML question form (`GET /`, `POST /ask`)
//! - `answer`: the JSON API (`POST /api/v1/answer`)
//! - `health`: liveness, readiness and Prometheus metrics

pub mod answer;
pub mod form;
pub mod health;

use crate::error::ServerError;
use crate::state::ServerState;
use policyqa::{GenerationResponse, RagError};
use std::time::Instant;

/// Run the pipeline once and record its outcome.
pub(crate) async fn answer_question(
    state: &ServerState,
    question: &str,
) -> Result<GenerationResponse, RagError> {
    let started = Instant::now();
    let result = state.engine.answer(question).await;

    if state.config.metrics_enabled {
        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.code(),
        };
        metrics::counter!("policyqa_answers_total", "outcome" => outcome).increment(1);
        metrics::histogram!("policyqa_answer_seconds").record(started.elapsed().as_secs_f64());
    }
    result
}

pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
