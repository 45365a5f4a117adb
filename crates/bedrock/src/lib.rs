//! PolicyQA model runtime
//!
//! Both the embedding and the generation adapters talk to models hosted on
//! Amazon Bedrock. This crate owns that transport: one [`ModelRuntime`] trait
//! taking a model id and a JSON body and handing back the raw response bytes,
//! plus [`HttpRuntime`], which POSTs to `/model/{id}/invoke` on the Bedrock
//! runtime REST endpoint using a Bedrock API key.
//!
//! Decoding the bytes is left to the adapters, since each one has its own
//! response schema and its own notion of "malformed".
//!
//! ```no_run
//! use bedrock::{HttpRuntime, ModelRuntime, RuntimeConfig};
//!
//! # async fn run() -> Result<(), bedrock::InvokeError> {
//! let cfg = RuntimeConfig::default().with_env_overrides();
//! let runtime = HttpRuntime::new(&cfg)?;
//! let body = br#"{"inputText": "baggage allowance"}"#.to_vec();
//! let raw = runtime.invoke_model("amazon.titan-embed-text-v2:0", body).await?;
//! # let _ = raw;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
mod http;

pub use crate::config::RuntimeConfig;
pub use crate::error::InvokeError;
pub use crate::http::HttpRuntime;

use async_trait::async_trait;

/// Invokes a hosted model with a serialized request body.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    async fn invoke_model(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, InvokeError>;
}
