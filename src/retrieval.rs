use std::sync::Arc;

use index::{ScoredChunk, VectorStore};
use semantic::Embedder;

use crate::RagError;

/// Embeds a query and looks up its nearest chunks.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Up to `k` chunks closest to `query_text`, best first.
    pub async fn similarity_search(
        &self,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, RagError> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be at least 1".into()));
        }
        let embedding = self.embedder.embed_one(query_text).await?;
        let hits = self
            .store
            .search(&embedding.model_id, &embedding.vector, k)
            .await?;
        tracing::debug!(k, returned = hits.len(), "retrieved chunks");
        Ok(hits)
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }
}
