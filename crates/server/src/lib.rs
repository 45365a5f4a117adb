//! HTTP front end for PolicyQA.
//!
//! One [`policyqa::QueryEngine`] is built at startup and shared by every
//! request.
//!
//! # Endpoints
//!
//! - `GET /` - question form
//! - `POST /ask` - submit the form (`application/x-www-form-urlencoded`)
//! - `POST /api/v1/answer` - JSON `{"question": "..."}`; returns the answer
//!   text and the model's response envelope
//! - `GET /health` - liveness
//! - `GET /ready` - index chunk count and embedding model
//! - `GET /metrics` - Prometheus text
//!
//! Errors on the JSON endpoints are `{"error": {"code", "message"}}` with
//! 400 for bad input, 502 when a model service fails and 503 when the index
//! is unavailable.
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, install_metrics, start_server};
pub use state::ServerState;
