//! PolicyQA: grounded question answering over a document corpus.
//!
//! A question goes through four stages:
//!
//! 1. **Embed** the question with the same model that embedded the corpus
//!    ([`semantic::Embedder`]).
//! 2. **Retrieve** the `top_k` closest chunks from the vector index
//!    ([`index::VectorStore`]).
//! 3. **Assemble** a prompt from a fixed instruction, the chunks in rank
//!    order, and the question ([`PromptAssembler`]).
//! 4. **Generate** an answer with a chat model ([`generate::Generator`]).
//!
//! [`QueryEngine`] owns one handle per stage. Handles are built once by the
//! hosting process and shared across requests; the engine keeps no
//! per-request state.
//!
//! ```no_run
//! use policyqa::{PolicyQaConfig, QueryEngine};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let cfg = PolicyQaConfig::from_file("policyqa.yaml")?.with_env_overrides();
//! let engine = QueryEngine::from_config(&cfg)?;
//! let response = engine.answer("What is the refund policy?").await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod prompt;
pub mod retrieval;

pub use crate::config::{ConfigLoadError, PolicyQaConfig, RetrievalConfig};
pub use crate::error::RagError;
pub use crate::prompt::{PromptAssembler, PromptConfig, DEFAULT_CORPUS_DESCRIPTION};
pub use crate::retrieval::Retriever;

pub use generate::{GenerationResponse, Generator, NovaGenerator};
pub use index::{LocalIndex, ScoredChunk, VectorStore};
pub use semantic::{Embedder, Truncator};

use std::sync::Arc;
use std::time::Instant;

use bedrock::{HttpRuntime, ModelRuntime};
use serde::Serialize;
use thiserror::Error;
use tracing::field::Empty;

/// Failures while wiring a [`QueryEngine`] from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("model runtime: {0}")]
    Runtime(#[from] bedrock::InvokeError),
    #[error("embedder: {0}")]
    Embedder(#[from] semantic::SemanticError),
    #[error(transparent)]
    Index(#[from] index::IndexError),
}

/// Snapshot of the index backing an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub chunks: usize,
    pub embedding_model: String,
}

/// Answers questions from retrieved context.
#[derive(Clone)]
pub struct QueryEngine {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    assembler: PromptAssembler,
    top_k: usize,
    budget: Option<PromptBudget>,
}

#[derive(Clone)]
struct PromptBudget {
    max_tokens: usize,
    counter: Arc<Truncator>,
}

impl QueryEngine {
    /// Engine with default retrieval settings and no prompt budget.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedder, store),
            generator,
            assembler: PromptAssembler::default(),
            top_k: RetrievalConfig::default().top_k,
            budget: None,
        }
    }

    /// Build every stage from `cfg`: HTTP runtime, embedder, on-disk index,
    /// Nova generator, and a `cl100k_base` counter for the prompt budget.
    pub fn from_config(cfg: &PolicyQaConfig) -> Result<Self, BuildError> {
        let runtime: Arc<dyn ModelRuntime> = Arc::new(HttpRuntime::new(&cfg.runtime)?);
        let embedder = semantic::build_embedder(&cfg.embedding, runtime.clone())?;
        let store = LocalIndex::open(&cfg.index, embedder.model_id())?;
        let generator = NovaGenerator::new(runtime, cfg.generation.clone());

        let mut engine = Self::new(embedder, Arc::new(store), Arc::new(generator))
            .with_top_k(cfg.retrieval.top_k)
            .with_prompt(PromptAssembler::new(cfg.prompt.clone()));
        if let Some(max_tokens) = cfg.retrieval.max_prompt_tokens {
            engine = engine.with_prompt_budget(max_tokens, Arc::new(Truncator::cl100k()?));
        }
        Ok(engine)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_prompt(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Drop lowest-ranked chunks until the prompt is at most `max_tokens`
    /// tokens as counted by `counter`.
    pub fn with_prompt_budget(mut self, max_tokens: usize, counter: Arc<Truncator>) -> Self {
        self.budget = Some(PromptBudget {
            max_tokens,
            counter,
        });
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `question` from the `top_k` closest chunks.
    ///
    /// The model's full response envelope is returned as-is.
    #[tracing::instrument(
        name = "answer",
        skip(self, question),
        fields(question_len = question.len(), chunks = Empty, elapsed_ms = Empty)
    )]
    pub async fn answer(&self, question: &str) -> Result<GenerationResponse, RagError> {
        let started = Instant::now();
        let chunks = self
            .retriever
            .similarity_search(question, self.top_k)
            .await?;
        let retrieved = chunks.len();

        let (prompt, kept) = self.fit_prompt(chunks, question);
        let span = tracing::Span::current();
        span.record("chunks", kept);
        if kept < retrieved {
            tracing::info!(retrieved, kept, "dropped chunks to fit prompt budget");
        }

        let response = self.generator.generate(&prompt).await?;
        span.record("elapsed_ms", started.elapsed().as_millis() as u64);
        tracing::info!(
            answer_bytes = response.text().len(),
            "answered question"
        );
        Ok(response)
    }

    /// Chunk count and embedding model of the backing index.
    pub async fn index_status(&self) -> Result<IndexStatus, RagError> {
        let store = self.retriever.store();
        Ok(IndexStatus {
            chunks: store.count().await?,
            embedding_model: store.embedding_model().to_string(),
        })
    }

    fn fit_prompt(&self, mut chunks: Vec<ScoredChunk>, question: &str) -> (String, usize) {
        let mut prompt = self.assembler.build_prompt(&chunks, question);
        let Some(budget) = &self.budget else {
            return (prompt, chunks.len());
        };

        while budget.counter.count_tokens(&prompt) > budget.max_tokens {
            if chunks.pop().is_none() {
                tracing::warn!(
                    max_tokens = budget.max_tokens,
                    "prompt exceeds budget without any context; sending as-is"
                );
                break;
            }
            prompt = self.assembler.build_prompt(&chunks, question);
        }
        (prompt, chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use generate::GenerateError;
    use index::{ChunkRecord, IndexManifest};
    use semantic::StubEmbedder;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Returns the prompt it was given as the answer.
    #[derive(Default)]
    struct Echo {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Generator for Echo {
        async fn generate(&self, prompt: &str) -> Result<GenerationResponse, GenerateError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(GenerationResponse::from_text(prompt))
        }

        fn model_id(&self) -> &str {
            "echo"
        }
    }

    async fn engine_over(texts: &[&str]) -> (QueryEngine, Arc<Echo>) {
        let embedder = StubEmbedder::new("stub-model", 16);
        let index = LocalIndex::in_memory(IndexManifest::new("stub-model", 16));
        for (i, text) in texts.iter().enumerate() {
            let vector = embedder.embed_one(text).await.unwrap().vector;
            index
                .insert(&ChunkRecord {
                    id: format!("chunk-{i}"),
                    text: text.to_string(),
                    metadata: BTreeMap::new(),
                    embedding: vector,
                })
                .unwrap();
        }
        let echo = Arc::new(Echo::default());
        let engine = QueryEngine::new(Arc::new(embedder), Arc::new(index), echo.clone());
        (engine, echo)
    }

    #[tokio::test]
    async fn answer_grounds_prompt_in_retrieved_chunks() {
        let (engine, echo) = engine_over(&["Policy A", "Policy B"]).await;
        let response = engine.answer("What is the refund policy?").await.unwrap();

        let text = response.text();
        assert!(text.contains("Policy A"));
        assert!(text.contains("Policy B"));
        assert!(text.contains("What is the refund policy?"));
        assert_eq!(echo.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn answer_uses_top_k() {
        let (engine, echo) = engine_over(&["a", "b", "c", "d", "e"]).await;
        engine.answer("q").await.unwrap();
        let prompt = echo.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("[3]"));
        assert!(!prompt.contains("[4]"));
    }

    #[tokio::test]
    async fn budget_drops_lowest_ranked_chunks_first() {
        let long = "baggage ".repeat(400);
        let (engine, echo) = engine_over(&["short policy", long.as_str()]).await;
        let counter = Arc::new(Truncator::cl100k().unwrap());

        let bare_prompt = PromptAssembler::default().build_prompt(&[], "short policy");
        let budget = counter.count_tokens(&bare_prompt) + 40;
        let engine = engine.with_prompt_budget(budget, counter);

        engine.answer("short policy").await.unwrap();
        let prompt = echo.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("[1]\nshort policy"));
        assert!(!prompt.contains("baggage baggage"));
    }

    #[tokio::test]
    async fn budget_too_small_for_question_sends_anyway() {
        let (engine, echo) = engine_over(&["Policy A"]).await;
        let engine = engine.with_prompt_budget(1, Arc::new(Truncator::cl100k().unwrap()));
        engine.answer("What is the refund policy?").await.unwrap();

        let prompt = echo.prompts.lock().unwrap()[0].clone();
        assert!(!prompt.contains("Policy A"));
        assert!(prompt.contains("What is the refund policy?"));
    }

    #[tokio::test]
    async fn index_status_reports_chunks_and_model() {
        let (engine, _) = engine_over(&["a", "b"]).await;
        let status = engine.index_status().await.unwrap();
        assert_eq!(
            status,
            IndexStatus {
                chunks: 2,
                embedding_model: "stub-model".into()
            }
        );
    }

    #[test]
    fn from_config_fails_without_index() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cfg = PolicyQaConfig::default();
        cfg.embedding.mode = semantic::EmbeddingMode::Stub;
        cfg.index.path = dir.path().join("missing");

        let err = QueryEngine::from_config(&cfg).err().expect("no index on disk");
        assert!(matches!(err, BuildError::Index(index::IndexError::Unavailable(_))));
    }
}
