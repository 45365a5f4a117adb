//! Router assembly and process lifecycle.

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{answer, form, health, not_found};
use crate::state::ServerState;
use anyhow::Context;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the router over `state`.
///
/// Layers run outermost first: tracing, request logging, request id, CORS,
/// compression, then the request timeout.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(form::index))
        .route("/ask", post(form::ask))
        .route("/api/v1/answer", post(answer::answer))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Install the global Prometheus recorder and describe the answer metrics.
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;
    metrics::describe_counter!(
        "policyqa_answers_total",
        "Questions answered, labelled by outcome"
    );
    metrics::describe_histogram!(
        "policyqa_answer_seconds",
        metrics::Unit::Seconds,
        "Time to embed, retrieve and generate one answer"
    );
    Ok(handle)
}

/// Serve until SIGTERM or Ctrl+C.
///
/// Startup fails if the pipeline configuration cannot be loaded or the
/// index cannot be opened; no request is accepted in that case.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .json()
        .init();

    let metrics = if config.metrics_enabled {
        Some(install_metrics()?)
    } else {
        None
    };
    let addr = config.socket_addr()?;
    let state = Arc::new(ServerState::new(config.clone(), metrics)?);
    let app = build_router(state);

    tracing::info!(
        %addr,
        timeout_secs = config.timeout_secs,
        cors = config.enable_cors,
        metrics = config.metrics_enabled,
        "starting policyqa server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
