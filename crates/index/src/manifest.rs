use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::IndexError;

/// Bump whenever the stored record layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Describes how the vectors in an index were produced.
///
/// Vectors from different models (or of different lengths) cannot be
/// compared, so every open and every query is checked against this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub schema_version: u16,
    pub embedding_model: String,
    pub dimension: usize,
}

impl IndexManifest {
    pub fn new(embedding_model: impl Into<String>, dimension: usize) -> Self {
        Self {
            schema_version: INDEX_SCHEMA_VERSION,
            embedding_model: embedding_model.into(),
            dimension,
        }
    }

    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let path = dir.join(MANIFEST_FILE);
        let raw = fs::read(&path)
            .map_err(|e| IndexError::Unavailable(format!("{}: {e}", path.display())))?;
        let manifest: IndexManifest = serde_json::from_slice(&raw)
            .map_err(|e| IndexError::Manifest(format!("{}: {e}", path.display())))?;
        if manifest.schema_version != INDEX_SCHEMA_VERSION {
            return Err(IndexError::Manifest(format!(
                "unsupported schema version {} (expected {INDEX_SCHEMA_VERSION})",
                manifest.schema_version
            )));
        }
        Ok(manifest)
    }

    pub fn store(&self, dir: &Path) -> Result<(), IndexError> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| IndexError::Manifest(e.to_string()))?;
        fs::write(&path, json).map_err(|e| IndexError::backend(format!("{}: {e}", path.display())))
    }

    /// Fails unless the index was built with `model_id`.
    pub fn ensure_model(&self, model_id: &str) -> Result<(), IndexError> {
        if self.embedding_model != model_id {
            return Err(IndexError::ModelMismatch {
                expected: self.embedding_model.clone(),
                found: model_id.to_string(),
            });
        }
        Ok(())
    }

    /// Fails unless vectors of length `dimension` fit this index.
    pub fn ensure_dimension(&self, dimension: usize) -> Result<(), IndexError> {
        if self.dimension != dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                found: dimension,
            });
        }
        Ok(())
    }
}
