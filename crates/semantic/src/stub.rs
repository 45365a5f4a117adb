use async_trait::async_trait;
use fxhash::hash64;

use crate::normalize::l2_normalize;
use crate::{Embedder, Embedding, SemanticConfig, SemanticError};

/// Offline embedder producing hash-seeded sinusoid vectors.
///
/// The same text always maps to the same vector, and distinct texts almost
/// always differ, which is enough to drive the retrieval path in tests and
/// local runs without credentials.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    model_id: String,
    dimension: usize,
    normalize: bool,
}

impl StubEmbedder {
    pub fn new(model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimension,
            normalize: false,
        }
    }

    pub fn from_config(cfg: &SemanticConfig) -> Self {
        Self {
            model_id: cfg.model_id.clone(),
            dimension: cfg.stub_dimension,
            normalize: cfg.normalize,
        }
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let h = hash64(text.as_bytes());
        let mut v: Vec<f32> = (0..self.dimension)
            .map(|idx| ((h >> (idx % 32)) as f32 * 0.0001 + idx as f32).sin())
            .collect();
        if self.normalize {
            l2_normalize(&mut v);
        }
        v
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_one(&self, text: &str) -> Result<Embedding, SemanticError> {
        Ok(Embedding::new(
            self.vector_for(text),
            self.model_id.clone(),
            self.normalize,
        ))
    }
}
