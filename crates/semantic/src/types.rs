use serde::{Deserialize, Serialize};

use crate::SemanticError;

/// A vector tied to the model that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    /// Identifier of the embedding model. Vectors from different models are
    /// not comparable.
    pub model_id: String,
    /// Length of `vector`.
    pub dimension: usize,
    /// Whether `vector` was L2-normalized after retrieval.
    pub normalized: bool,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, model_id: impl Into<String>, normalized: bool) -> Self {
        let dimension = vector.len();
        Self {
            vector,
            model_id: model_id.into(),
            dimension,
            normalized,
        }
    }
}

/// Result of embedding several texts one by one.
///
/// Failed items are skipped rather than aborting the batch. Each entry keeps
/// the position of its input so callers can line results back up.
#[derive(Debug, Clone, Default)]
pub struct BatchEmbeddings {
    /// `(input index, embedding)` in input order.
    pub embeddings: Vec<(usize, Embedding)>,
    /// `(input index, error)` for every skipped input.
    pub failures: Vec<(usize, SemanticError)>,
}

impl BatchEmbeddings {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            embeddings: Vec::with_capacity(capacity),
            failures: Vec::new(),
        }
    }

    /// True when no input was skipped.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of successful embeddings.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Drop the indices and keep only the successful embeddings, in order.
    pub fn into_embeddings(self) -> Vec<Embedding> {
        self.embeddings.into_iter().map(|(_, e)| e).collect()
    }
}
