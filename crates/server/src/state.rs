use crate::config::ServerConfig;
use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use policyqa::{PolicyQaConfig, QueryEngine};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,

    /// Built once at startup; shared read-only by every request.
    pub engine: QueryEngine,

    /// Present when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,

    pub started_at: Instant,
}

impl ServerState {
    /// Load the pipeline configuration and build the query engine.
    ///
    /// Fails when the index directory is missing or was built with another
    /// embedding model.
    pub fn new(config: ServerConfig, metrics: Option<PrometheusHandle>) -> anyhow::Result<Self> {
        let pipeline = match &config.pipeline_config {
            Some(path) => PolicyQaConfig::from_file(path)
                .with_context(|| format!("loading pipeline config {}", path.display()))?,
            None => PolicyQaConfig::default(),
        }
        .with_env_overrides();

        let engine = QueryEngine::from_config(&pipeline).context("building query engine")?;
        tracing::info!(
            embedding_model = %pipeline.embedding.model_id,
            generation_model = %pipeline.generation.model_id,
            index = %pipeline.index.path.display(),
            top_k = pipeline.retrieval.top_k,
            "query engine ready"
        );
        Ok(Self::with_engine(config, engine, metrics))
    }

    pub fn with_engine(
        config: ServerConfig,
        engine: QueryEngine,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            metrics,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
