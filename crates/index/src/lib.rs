//! # PolicyQA Index
//!
//! Persisted document chunks and the similarity search that answers
//! "which chunks are closest to this question?".
//!
//! An index is a directory holding two files:
//!
//! - `manifest.json` - the embedding model and vector dimension the index was
//!   built with, plus a schema version.
//! - `chunks.redb` - one record per chunk (id, text, metadata, embedding),
//!   bincode-encoded and zstd-compressed.
//!
//! At query time the directory is opened without writing anything. A missing
//! directory, a missing manifest, or a manifest naming a different embedding
//! model is an error; there is no empty fallback index.
//!
//! Search is an exact cosine scan over every stored chunk. Results are sorted
//! by descending score, ties broken by chunk id. The scan runs on tokio's
//! blocking pool.
//!
//! ## Example
//!
//! ```
//! use index::{ChunkRecord, IndexManifest, LocalIndex};
//! use std::collections::BTreeMap;
//!
//! let index = LocalIndex::in_memory(IndexManifest::new("stub-model", 2));
//! index.insert(&ChunkRecord {
//!     id: "refunds-1".into(),
//!     text: "Refunds are processed within 7 days.".into(),
//!     metadata: BTreeMap::from([("source".to_string(), "refunds.pdf".to_string())]),
//!     embedding: vec![1.0, 0.0],
//! }).unwrap();
//!
//! let hits = index.search_blocking("stub-model", &[1.0, 0.1], 3).unwrap();
//! assert_eq!(hits[0].id, "refunds-1");
//! ```

mod backend;
mod manifest;
mod query;

#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use backend::{InMemoryBackend, IndexBackend};
pub use manifest::{IndexManifest, INDEX_SCHEMA_VERSION, MANIFEST_FILE};
pub use query::cosine_similarity;

use async_trait::async_trait;
use bincode::config::standard;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use zstd::{decode_all, encode_all};

use crate::query::TopK;

pub const CHUNKS_FILE: &str = "chunks.redb";

/// One stored chunk of a source document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChunkRecord {
    /// Unique within the index.
    pub id: String,
    pub text: String,
    /// Free-form string metadata. `source` and `page` are rendered into prompts.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub embedding: Vec<f32>,
}

/// A chunk returned by a similarity search.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScoredChunk {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    /// Cosine similarity to the query, higher is closer.
    pub score: f32,
}

impl ScoredChunk {
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").map(String::as_str)
    }

    pub fn page(&self) -> Option<&str> {
        self.metadata.get("page").map(String::as_str)
    }
}

/// Where the index lives and how records are compressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub path: PathBuf,
    /// zstd level used when writing records.
    pub zstd_level: i32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./policyqa_index"),
            zstd_level: 3,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum IndexError {
    /// The index directory, manifest or database cannot be opened.
    #[error("index unavailable: {0}")]
    Unavailable(String),
    #[error("invalid index manifest: {0}")]
    Manifest(String),
    #[error("index was built with embedding model '{expected}', query uses '{found}'")]
    ModelMismatch { expected: String, found: String },
    #[error("index stores {expected}-dimensional vectors, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization encode error: {0}")]
    Encode(String),
    #[error("serialization decode error: {0}")]
    Decode(String),
    #[error("compression error: {0}")]
    Zstd(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Zstd(e.to_string())
    }
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Nearest-neighbour lookup over stored chunks.
///
/// `model_id` names the model that produced `query`; stores refuse queries
/// from a model other than the one they were built with.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn search(
        &self,
        model_id: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize, IndexError>;

    /// Embedding model the stored vectors came from.
    fn embedding_model(&self) -> &str;
}

/// A chunk index on top of an [`IndexBackend`].
#[derive(Clone)]
pub struct LocalIndex {
    backend: Arc<dyn IndexBackend>,
    manifest: Arc<IndexManifest>,
    zstd_level: i32,
}

impl std::fmt::Debug for LocalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalIndex")
            .field("manifest", &self.manifest)
            .field("zstd_level", &self.zstd_level)
            .finish_non_exhaustive()
    }
}

impl LocalIndex {
    pub fn with_backend(manifest: IndexManifest, backend: Arc<dyn IndexBackend>) -> Self {
        Self {
            backend,
            manifest: Arc::new(manifest),
            zstd_level: IndexConfig::default().zstd_level,
        }
    }

    /// An empty index that lives only as long as the value.
    pub fn in_memory(manifest: IndexManifest) -> Self {
        Self::with_backend(manifest, Arc::new(InMemoryBackend::new()))
    }

    /// Open an existing index directory for queries from `model_id`.
    #[cfg(feature = "backend-redb")]
    pub fn open(cfg: &IndexConfig, model_id: &str) -> Result<Self, IndexError> {
        let dir = cfg.path.as_path();
        if !dir.is_dir() {
            return Err(IndexError::Unavailable(format!(
                "index directory {} does not exist",
                dir.display()
            )));
        }
        let manifest = IndexManifest::load(dir)?;
        manifest.ensure_model(model_id)?;

        let backend = RedbBackend::open_read_only(dir.join(CHUNKS_FILE))?;
        tracing::info!(
            path = %dir.display(),
            embedding_model = %manifest.embedding_model,
            dimension = manifest.dimension,
            "opened index"
        );
        Ok(Self {
            backend: Arc::new(backend),
            manifest: Arc::new(manifest),
            zstd_level: cfg.zstd_level,
        })
    }

    /// Create (or reopen for writing) an index directory.
    ///
    /// An existing manifest must match `manifest`.
    #[cfg(feature = "backend-redb")]
    pub fn create(cfg: &IndexConfig, manifest: IndexManifest) -> Result<Self, IndexError> {
        let dir = cfg.path.as_path();
        std::fs::create_dir_all(dir)
            .map_err(|e| IndexError::backend(format!("{}: {e}", dir.display())))?;

        if dir.join(MANIFEST_FILE).exists() {
            let existing = IndexManifest::load(dir)?;
            existing.ensure_model(&manifest.embedding_model)?;
            existing.ensure_dimension(manifest.dimension)?;
        } else {
            manifest.store(dir)?;
        }

        let backend = RedbBackend::create(dir.join(CHUNKS_FILE))?;
        Ok(Self {
            backend: Arc::new(backend),
            manifest: Arc::new(manifest),
            zstd_level: cfg.zstd_level,
        })
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Insert or replace one chunk.
    pub fn insert(&self, record: &ChunkRecord) -> Result<(), IndexError> {
        self.manifest.ensure_dimension(record.embedding.len())?;
        let payload = self.encode_record(record)?;
        self.backend.put(&record.id, &payload)
    }

    /// Insert several chunks in one write. Nothing is written if any record
    /// has the wrong dimension.
    pub fn batch_insert(&self, records: &[ChunkRecord]) -> Result<(), IndexError> {
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            self.manifest.ensure_dimension(record.embedding.len())?;
            entries.push((record.id.clone(), self.encode_record(record)?));
        }
        self.backend.batch_put(entries)?;
        tracing::debug!(inserted = records.len(), "batch inserted chunks");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<ChunkRecord>, IndexError> {
        match self.backend.get(id)? {
            Some(data) => Ok(Some(decode_record(&data)?)),
            None => Ok(None),
        }
    }

    pub fn delete(&self, id: &str) -> Result<(), IndexError> {
        self.backend.delete(id)
    }

    pub fn len(&self) -> Result<usize, IndexError> {
        self.backend.count()
    }

    pub fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len()? == 0)
    }

    /// Exact top-`k` search on the calling thread.
    pub fn search_blocking(
        &self,
        model_id: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        self.manifest.ensure_model(model_id)?;
        self.manifest.ensure_dimension(query.len())?;

        let mut top = TopK::new(k);
        let mut scanned = 0usize;
        self.backend.scan(&mut |data: &[u8]| {
            let record = decode_record(data)?;
            scanned += 1;
            top.offer(query, record);
            Ok(())
        })?;

        let hits = top.into_sorted();
        tracing::debug!(scanned, returned = hits.len(), k, "similarity scan finished");
        Ok(hits)
    }

    fn encode_record(&self, record: &ChunkRecord) -> Result<Vec<u8>, IndexError> {
        let encoded = encode_to_vec(record, standard())?;
        Ok(encode_all(encoded.as_slice(), self.zstd_level)?)
    }
}

fn decode_record(data: &[u8]) -> Result<ChunkRecord, IndexError> {
    let decompressed = decode_all(data)?;
    let (record, _) = decode_from_slice(&decompressed, standard())?;
    Ok(record)
}

#[async_trait]
impl VectorStore for LocalIndex {
    async fn search(
        &self,
        model_id: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let index = self.clone();
        let model_id = model_id.to_string();
        let query = query.to_vec();
        tokio::task::spawn_blocking(move || index.search_blocking(&model_id, &query, k))
            .await
            .map_err(|e| IndexError::backend(format!("search task failed: {e}")))?
    }

    async fn count(&self) -> Result<usize, IndexError> {
        let index = self.clone();
        tokio::task::spawn_blocking(move || index.len())
            .await
            .map_err(|e| IndexError::backend(format!("count task failed: {e}")))?
    }

    fn embedding_model(&self) -> &str {
        &self.manifest.embedding_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MODEL: &str = "amazon.titan-embed-text-v2:0";

    fn chunk(id: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            text: format!("policy text {id}"),
            metadata: BTreeMap::from([
                ("source".to_string(), format!("{id}.pdf")),
                ("page".to_string(), "1".to_string()),
            ]),
            embedding,
        }
    }

    fn five_chunks() -> Vec<ChunkRecord> {
        vec![
            chunk("c1", vec![1.0, 0.0, 0.0]),
            chunk("c2", vec![0.9, 0.1, 0.0]),
            chunk("c3", vec![0.0, 1.0, 0.0]),
            chunk("c4", vec![0.5, 0.5, 0.0]),
            chunk("c5", vec![0.0, 0.0, 1.0]),
        ]
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let index = LocalIndex::in_memory(IndexManifest::new(MODEL, 3));
        let record = chunk("c1", vec![1.0, 2.0, 3.0]);
        index.insert(&record).unwrap();

        assert_eq!(index.get("c1").unwrap(), Some(record));
        assert_eq!(index.get("missing").unwrap(), None);
        assert_eq!(index.len().unwrap(), 1);

        index.delete("c1").unwrap();
        assert!(index.is_empty().unwrap());
    }

    #[test]
    fn insert_rejects_wrong_dimension() {
        let index = LocalIndex::in_memory(IndexManifest::new(MODEL, 3));
        let err = index.insert(&chunk("c1", vec![1.0])).unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { expected: 3, found: 1 }));

        let err = index
            .batch_insert(&[chunk("ok", vec![1.0, 0.0, 0.0]), chunk("bad", vec![1.0])])
            .unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
        assert!(index.is_empty().unwrap());
    }

    #[tokio::test]
    async fn search_returns_k_by_descending_score() {
        let index = LocalIndex::in_memory(IndexManifest::new(MODEL, 3));
        index.batch_insert(&five_chunks()).unwrap();

        let hits = index.search(MODEL, &[1.0, 0.0, 0.0], 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c4"]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(hits[0].source(), Some("c1.pdf"));
        assert_eq!(hits[0].page(), Some("1"));
    }

    #[tokio::test]
    async fn search_on_empty_index_is_empty() {
        let index = LocalIndex::in_memory(IndexManifest::new(MODEL, 3));
        let hits = index.search(MODEL, &[1.0, 0.0, 0.0], 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_rejects_foreign_model_and_dimension() {
        let index = LocalIndex::in_memory(IndexManifest::new(MODEL, 3));
        let err = index.search("other-model", &[1.0, 0.0, 0.0], 3).await.unwrap_err();
        assert!(matches!(err, IndexError::ModelMismatch { .. }));

        let err = index.search(MODEL, &[1.0, 0.0], 3).await.unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn persisted_index_reopens_for_queries() {
        let dir = TempDir::new().unwrap();
        let cfg = IndexConfig {
            path: dir.path().join("idx"),
            ..Default::default()
        };
        {
            let index = LocalIndex::create(&cfg, IndexManifest::new(MODEL, 3)).unwrap();
            index.batch_insert(&five_chunks()).unwrap();
        }

        assert!(cfg.path.join(MANIFEST_FILE).exists());
        assert!(cfg.path.join(CHUNKS_FILE).exists());

        let index = LocalIndex::open(&cfg, MODEL).unwrap();
        assert_eq!(VectorStore::count(&index).await.unwrap(), 5);
        assert_eq!(index.embedding_model(), MODEL);
        let hits = index.search(MODEL, &[0.0, 1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].id, "c3");
    }

    #[tokio::test]
    async fn index_opens_for_several_readers_at_once() {
        let dir = TempDir::new().unwrap();
        let cfg = IndexConfig {
            path: dir.path().join("idx"),
            ..Default::default()
        };
        LocalIndex::create(&cfg, IndexManifest::new(MODEL, 3))
            .unwrap()
            .batch_insert(&five_chunks())
            .unwrap();

        let server = LocalIndex::open(&cfg, MODEL).unwrap();
        let cli = LocalIndex::open(&cfg, MODEL).unwrap();
        assert_eq!(VectorStore::count(&server).await.unwrap(), 5);
        let hits = cli.search(MODEL, &[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].id, "c1");

        let err = cli.insert(&chunk("c6", vec![0.0, 0.0, 1.0])).unwrap_err();
        assert!(matches!(err, IndexError::Backend(_)));
    }

    #[test]
    fn open_missing_directory_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let cfg = IndexConfig {
            path: dir.path().join("never-built"),
            ..Default::default()
        };
        let err = LocalIndex::open(&cfg, MODEL).unwrap_err();
        assert!(matches!(err, IndexError::Unavailable(_)));
        assert!(!cfg.path.exists());
    }

    #[test]
    fn open_with_different_model_fails() {
        let dir = TempDir::new().unwrap();
        let cfg = IndexConfig {
            path: dir.path().to_path_buf(),
            ..Default::default()
        };
        LocalIndex::create(&cfg, IndexManifest::new("amazon.titan-embed-text-v1", 3)).unwrap();

        let err = LocalIndex::open(&cfg, MODEL).unwrap_err();
        assert!(matches!(err, IndexError::ModelMismatch { .. }));
    }

    #[test]
    fn create_rejects_conflicting_manifest() {
        let dir = TempDir::new().unwrap();
        let cfg = IndexConfig {
            path: dir.path().to_path_buf(),
            ..Default::default()
        };
        LocalIndex::create(&cfg, IndexManifest::new(MODEL, 3)).unwrap();
        let err = LocalIndex::create(&cfg, IndexManifest::new(MODEL, 4)).unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }
}
