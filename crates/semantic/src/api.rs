use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bedrock::ModelRuntime;
use serde::{Deserialize, Serialize};

use crate::normalize::l2_normalize;
use crate::truncate::Truncator;
use crate::{Embedder, Embedding, SemanticConfig, SemanticError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TitanRequest<'a> {
    input_text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitanResponse {
    embedding: Vec<f32>,
    #[serde(default)]
    input_text_token_count: Option<u32>,
}

/// Embeds text with a Titan text-embedding model hosted behind a [`ModelRuntime`].
pub struct BedrockEmbedder {
    runtime: Arc<dyn ModelRuntime>,
    truncator: Truncator,
    model_id: String,
    max_input_tokens: usize,
    normalize: bool,
}

impl std::fmt::Debug for BedrockEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockEmbedder")
            .field("model_id", &self.model_id)
            .field("max_input_tokens", &self.max_input_tokens)
            .field("normalize", &self.normalize)
            .field("truncator", &self.truncator)
            .finish_non_exhaustive()
    }
}

impl BedrockEmbedder {
    pub fn new(
        runtime: Arc<dyn ModelRuntime>,
        truncator: Truncator,
        cfg: &SemanticConfig,
    ) -> Self {
        Self {
            runtime,
            truncator,
            model_id: cfg.model_id.clone(),
            max_input_tokens: cfg.max_input_tokens,
            normalize: cfg.normalize,
        }
    }

    /// Build with the tokenizer named in `cfg`.
    pub fn from_config(
        runtime: Arc<dyn ModelRuntime>,
        cfg: &SemanticConfig,
    ) -> Result<Self, SemanticError> {
        let truncator = Truncator::from_spec(&cfg.tokenizer)?;
        Ok(Self::new(runtime, truncator, cfg))
    }
}

#[async_trait]
impl Embedder for BedrockEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_one(&self, text: &str) -> Result<Embedding, SemanticError> {
        let input = self.truncator.truncate(text, self.max_input_tokens);
        let body = serde_json::to_vec(&TitanRequest {
            input_text: input.as_ref(),
        })
        .map_err(|e| SemanticError::Encode(e.to_string()))?;

        let started = Instant::now();
        let raw = self.runtime.invoke_model(&self.model_id, body).await?;
        let response = decode_response(&raw)?;

        tracing::debug!(
            model_id = %self.model_id,
            dimension = response.embedding.len(),
            input_tokens = response.input_text_token_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "embedded text"
        );

        let mut vector = response.embedding;
        if self.normalize {
            l2_normalize(&mut vector);
        }
        Ok(Embedding::new(vector, self.model_id.clone(), self.normalize))
    }
}

fn decode_response(raw: &[u8]) -> Result<TitanResponse, SemanticError> {
    let response: TitanResponse = serde_json::from_slice(raw)
        .map_err(|e| SemanticError::MalformedResponse(e.to_string()))?;
    if response.embedding.is_empty() {
        return Err(SemanticError::MalformedResponse(
            "embedding array is empty".into(),
        ));
    }
    Ok(response)
}
