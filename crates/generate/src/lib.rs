//! PolicyQA answer generation
//!
//! Sends an assembled prompt to a chat model as a single user turn and
//! decodes the reply into a typed [`GenerationResponse`]. The request uses
//! the `messages-v1` schema with a fixed system instruction and fixed
//! sampling parameters (both configurable through [`GenerationConfig`]).
//!
//! One call, one attempt: failures surface as [`GenerateError`] with no retry
//! and no fallback model.

pub mod config;
pub mod error;
pub mod types;

pub use crate::config::{GenerationConfig, InferenceParams};
pub use crate::error::GenerateError;
pub use crate::types::{ContentBlock, GenerationResponse, Message, ResponseMetrics, Usage};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bedrock::ModelRuntime;

use crate::types::GenerationRequest;

/// Produces an answer for a fully assembled prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse, GenerateError>;

    fn model_id(&self) -> &str;
}

/// Amazon Nova chat models over a [`ModelRuntime`].
pub struct NovaGenerator {
    runtime: Arc<dyn ModelRuntime>,
    cfg: GenerationConfig,
}

impl NovaGenerator {
    pub fn new(runtime: Arc<dyn ModelRuntime>, cfg: GenerationConfig) -> Self {
        Self { runtime, cfg }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.cfg
    }
}

impl std::fmt::Debug for NovaGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NovaGenerator")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Generator for NovaGenerator {
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse, GenerateError> {
        let request =
            GenerationRequest::single_turn(prompt, &self.cfg.system_prompt, &self.cfg.inference);
        let body = serde_json::to_vec(&request).map_err(|e| GenerateError::Encode(e.to_string()))?;

        let started = Instant::now();
        let raw = self.runtime.invoke_model(&self.cfg.model_id, body).await?;
        let response = GenerationResponse::from_slice(&raw)?;

        tracing::debug!(
            model_id = %self.cfg.model_id,
            prompt_chars = prompt.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = response.stop_reason.as_deref().unwrap_or("unknown"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated answer"
        );
        Ok(response)
    }

    fn model_id(&self) -> &str {
        &self.cfg.model_id
    }
}
