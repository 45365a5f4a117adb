use serde::{Deserialize, Serialize};

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InferenceParams {
    pub max_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
    pub temperature: f32,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            top_p: 0.1,
            top_k: 20,
            temperature: 0.0,
        }
    }
}

/// Configuration for the answer generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model_id: String,
    /// Sent as the single system content block.
    pub system_prompt: String,
    pub inference: InferenceParams,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: "us.amazon.nova-pro-v1:0".into(),
            system_prompt: "You are a helpful assistant".into(),
            inference: InferenceParams::default(),
        }
    }
}

impl GenerationConfig {
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.inference.max_tokens = max_tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployed_model() {
        let cfg = GenerationConfig::default();
        assert_eq!(cfg.model_id, "us.amazon.nova-pro-v1:0");
        assert_eq!(cfg.system_prompt, "You are a helpful assistant");
        assert_eq!(cfg.inference.max_tokens, 300);
        assert_eq!(cfg.inference.top_k, 20);
        assert!((cfg.inference.top_p - 0.1).abs() < f32::EPSILON);
        assert_eq!(cfg.inference.temperature, 0.0);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg: GenerationConfig =
            serde_json::from_str(r#"{"inference": {"maxTokens": 512}}"#).unwrap();
        assert_eq!(cfg.inference.max_tokens, 512);
        assert_eq!(cfg.inference.top_k, 20);
        assert_eq!(cfg.model_id, "us.amazon.nova-pro-v1:0");
    }

    #[test]
    fn builders() {
        let cfg = GenerationConfig::default()
            .with_model("us.amazon.nova-lite-v1:0")
            .with_max_tokens(64);
        assert_eq!(cfg.model_id, "us.amazon.nova-lite-v1:0");
        assert_eq!(cfg.inference.max_tokens, 64);
    }
}
