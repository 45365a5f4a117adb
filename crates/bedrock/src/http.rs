use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::time::Instant;

use crate::{InvokeError, ModelRuntime, RuntimeConfig};

/// [`ModelRuntime`] backed by the Bedrock runtime REST API.
///
/// Holds one pooled `reqwest::Client`; construct it once per process and share
/// it behind an `Arc`.
pub struct HttpRuntime {
    client: reqwest::Client,
    endpoint: String,
    auth_header: Option<String>,
}

impl HttpRuntime {
    pub fn new(cfg: &RuntimeConfig) -> Result<Self, InvokeError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(cfg.connect_timeout())
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| InvokeError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        if cfg.api_key.is_none() {
            tracing::warn!("no Bedrock API key configured; requests will be sent unauthenticated");
        }

        Ok(Self {
            client,
            endpoint: cfg.endpoint_url(),
            auth_header: cfg.api_key.as_ref().map(|key| format!("Bearer {key}")),
        })
    }

    fn invoke_url(&self, model_id: &str) -> String {
        format!(
            "{}/model/{}/invoke",
            self.endpoint,
            urlencoding::encode(model_id)
        )
    }

    fn map_error(model_id: &str, err: reqwest::Error) -> InvokeError {
        if err.is_timeout() {
            InvokeError::Timeout {
                model_id: model_id.to_string(),
            }
        } else {
            InvokeError::Transport {
                model_id: model_id.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ModelRuntime for HttpRuntime {
    async fn invoke_model(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, InvokeError> {
        let started = Instant::now();
        let mut request = self
            .client
            .post(self.invoke_url(model_id))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header(AUTHORIZATION, header);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| Self::map_error(model_id, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model_id, status = status.as_u16(), "model invocation rejected");
            return Err(InvokeError::Status {
                model_id: model_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(model_id, e))?;

        tracing::debug!(
            model_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_bytes = bytes.len(),
            "model invocation complete"
        );
        Ok(bytes.to_vec())
    }
}
