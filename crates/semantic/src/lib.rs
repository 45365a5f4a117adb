//! PolicyQA Embedding Adapter
//!
//! Turns text into dense vectors for similarity search. Questions and
//! document chunks both go through here, so the same model and the same token
//! budget apply on both sides of the index.
//!
//! Two embedders ship with the crate:
//!
//! - **[`BedrockEmbedder`]** - sends `{"inputText": ..}` to a Titan text
//!   embedding model through a [`bedrock::ModelRuntime`]. Input is cut to
//!   `max_input_tokens` first so the service never rejects it for length.
//! - **[`StubEmbedder`]** - hash-seeded vectors, no network. Handy for tests
//!   and for poking at the pipeline without credentials.
//!
//! Pick one with [`build_embedder`] or construct it directly.
//!
//! ## Batches
//!
//! [`Embedder::embed_many`] calls `embed_one` for each text in order. A text
//! that fails is logged and reported in [`BatchEmbeddings::failures`]; the rest
//! of the batch still runs. The call itself never fails.
//!
//! ## Quick example
//!
//! ```
//! use semantic::{Embedder, StubEmbedder};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let embedder = StubEmbedder::new("stub", 16);
//! let embedding = embedder.embed_one("excess baggage fees").await.unwrap();
//! assert_eq!(embedding.dimension, 16);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod truncate;
pub mod types;

mod api;
mod normalize;
mod stub;

pub use crate::api::BedrockEmbedder;
pub use crate::config::{EmbeddingMode, SemanticConfig, TokenizerSpec};
pub use crate::error::SemanticError;
pub use crate::stub::StubEmbedder;
pub use crate::truncate::Truncator;
pub use crate::types::{BatchEmbeddings, Embedding};

use std::sync::Arc;

use async_trait::async_trait;
use bedrock::ModelRuntime;

/// Maps text to vectors with a single, fixed model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the model behind this embedder.
    fn model_id(&self) -> &str;

    /// Embed one text. Errors propagate to the caller.
    async fn embed_one(&self, text: &str) -> Result<Embedding, SemanticError>;

    /// Embed several texts strictly one after another.
    ///
    /// Per-item failures are logged and collected; successes keep their
    /// relative input order.
    async fn embed_many(&self, texts: &[String]) -> BatchEmbeddings {
        let mut batch = BatchEmbeddings::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            match self.embed_one(text).await {
                Ok(embedding) => batch.embeddings.push((index, embedding)),
                Err(err) => {
                    tracing::warn!(
                        index,
                        model_id = %self.model_id(),
                        error = %err,
                        "skipping text that failed to embed"
                    );
                    batch.failures.push((index, err));
                }
            }
        }
        tracing::debug!(
            requested = texts.len(),
            embedded = batch.embeddings.len(),
            failed = batch.failures.len(),
            "batch embedding finished"
        );
        batch
    }
}

/// Build the embedder selected by `cfg.mode`.
///
/// The stub ignores `runtime`.
pub fn build_embedder(
    cfg: &SemanticConfig,
    runtime: Arc<dyn ModelRuntime>,
) -> Result<Arc<dyn Embedder>, SemanticError> {
    match cfg.mode {
        EmbeddingMode::Bedrock => Ok(Arc::new(BedrockEmbedder::from_config(runtime, cfg)?)),
        EmbeddingMode::Stub => Ok(Arc::new(StubEmbedder::from_config(cfg))),
    }
}
