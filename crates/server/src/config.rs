use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds. Covers the embedding and generation calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// `tracing` filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Serve `GET /metrics` and record answer metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Pipeline YAML. Built-in defaults apply when unset.
    #[serde(default)]
    pub pipeline_config: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            pipeline_config: None,
        }
    }
}

impl ServerConfig {
    /// Layer `server.toml` (optional) under `POLICYQA_SERVER__*` variables.
    /// A `.env` file in the working directory is read first.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(config::Environment::with_prefix("POLICYQA_SERVER").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr.parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
