use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding a Bedrock API key.
pub const API_KEY_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";
/// Environment variable overriding the region.
pub const REGION_ENV: &str = "AWS_REGION";

/// Connection settings for the hosted model runtime.
///
/// # Example
/// ```
/// use bedrock::RuntimeConfig;
///
/// let cfg = RuntimeConfig {
///     region: "us-east-2".into(),
///     api_key: Some("bedrock-api-key".into()),
///     ..Default::default()
/// };
/// assert_eq!(cfg.endpoint_url(), "https://bedrock-runtime.us-east-2.amazonaws.com");
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// AWS region hosting the models.
    pub region: String,
    /// Explicit endpoint, e.g. a VPC endpoint or a local test server. When
    /// absent the public regional endpoint is used.
    pub endpoint: Option<String>,
    /// Bedrock API key sent as `Authorization: Bearer <key>`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            region: "us-east-2".into(),
            endpoint: None,
            api_key: None,
            connect_timeout_secs: 10,
            timeout_secs: 60,
        }
    }
}

// Hand-written so the API key never lands in logs.
impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RuntimeConfig {
    /// Base URL requests are sent to.
    pub fn endpoint_url(&self) -> String {
        match self.endpoint.as_deref() {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Fill the API key and region from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(region) = lookup(REGION_ENV).filter(|v| !v.trim().is_empty()) {
            self.region = region;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_us_east_2() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.region, "us-east-2");
        assert_eq!(cfg.timeout(), Duration::from_secs(60));
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));
        assert_eq!(
            cfg.endpoint_url(),
            "https://bedrock-runtime.us-east-2.amazonaws.com"
        );
    }

    #[test]
    fn explicit_endpoint_wins_and_drops_trailing_slash() {
        let cfg = RuntimeConfig {
            endpoint: Some("http://127.0.0.1:9000/".into()),
            ..Default::default()
        };
        assert_eq!(cfg.endpoint_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn overrides_fill_key_and_region() {
        let cfg = RuntimeConfig::default().with_overrides_from(|key| match key {
            API_KEY_ENV => Some("secret".into()),
            REGION_ENV => Some("eu-west-1".into()),
            _ => None,
        });
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.region, "eu-west-1");
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let cfg = RuntimeConfig {
            api_key: Some("kept".into()),
            ..Default::default()
        }
        .with_overrides_from(|_| Some("  ".into()));
        assert_eq!(cfg.api_key.as_deref(), Some("kept"));
        assert_eq!(cfg.region, "us-east-2");
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = RuntimeConfig {
            api_key: Some("top-secret".into()),
            ..Default::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn api_key_is_not_serialized() {
        let cfg = RuntimeConfig {
            api_key: Some("top-secret".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("top-secret"));
    }
}
