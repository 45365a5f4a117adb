//! YAML configuration for the PolicyQA pipeline.
//!
//! One file describes the whole pipeline: how to reach the hosted models,
//! which embedding and chat models to use, where the index lives, and how
//! prompts are built. Every section and every field is optional.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # PolicyQA Pipeline Configuration
//! version: "1.0"
//!
//! runtime:
//!   region: "us-east-2"
//!   timeout_secs: 60
//!
//! embedding:
//!   mode: "bedrock"
//!   model_id: "amazon.titan-embed-text-v2:0"
//!   max_input_tokens: 8000
//!   tokenizer:
//!     kind: "cl100k_base"
//!
//! index:
//!   path: "./policyqa_index"
//!
//! generation:
//!   model_id: "us.amazon.nova-pro-v1:0"
//!   inference:
//!     maxTokens: 300
//!     topP: 0.1
//!     topK: 20
//!     temperature: 0
//!
//! prompt:
//!   corpus_description: "Air India, its operations, policies, and other related topics"
//!
//! retrieval:
//!   top_k: 3
//!   max_prompt_tokens: 24000
//! ```
//!
//! The Bedrock API key is never read from the file's serialized form; set
//! `AWS_BEARER_TOKEN_BEDROCK` (and optionally `AWS_REGION`) and call
//! [`PolicyQaConfig::with_env_overrides`].

use std::fs;
use std::path::Path;

use bedrock::RuntimeConfig;
use generate::GenerationConfig;
use index::IndexConfig;
use semantic::{EmbeddingMode, SemanticConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompt::PromptConfig;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyQaConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub embedding: SemanticConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl Default for PolicyQaConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            runtime: RuntimeConfig::default(),
            embedding: SemanticConfig::default(),
            index: IndexConfig::default(),
            generation: GenerationConfig::default(),
            prompt: PromptConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl PolicyQaConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PolicyQaConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Pull the API key and region from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        self.runtime = self.runtime.with_env_overrides();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if self.runtime.timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "runtime.timeout_secs must be >= 1".to_string(),
            ));
        }
        if self.embedding.model_id.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "embedding.model_id must not be empty".to_string(),
            ));
        }
        if self.embedding.max_input_tokens == 0 {
            return Err(ConfigLoadError::Validation(
                "embedding.max_input_tokens must be >= 1".to_string(),
            ));
        }
        if self.embedding.mode == EmbeddingMode::Stub && self.embedding.stub_dimension == 0 {
            return Err(ConfigLoadError::Validation(
                "embedding.stub_dimension must be >= 1".to_string(),
            ));
        }
        if self.generation.model_id.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "generation.model_id must not be empty".to_string(),
            ));
        }
        if self.generation.inference.max_tokens == 0 {
            return Err(ConfigLoadError::Validation(
                "generation.inference.maxTokens must be >= 1".to_string(),
            ));
        }
        self.retrieval.validate()
    }
}

/// How many chunks to retrieve and how large the prompt may grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Prompt budget in tokens; lowest-ranked chunks are dropped to fit.
    /// `None` disables the budget.
    pub max_prompt_tokens: Option<usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_prompt_tokens: Some(24_000),
        }
    }
}

impl RetrievalConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.top_k == 0 {
            return Err(ConfigLoadError::Validation(
                "retrieval.top_k must be >= 1".to_string(),
            ));
        }
        if self.max_prompt_tokens == Some(0) {
            return Err(ConfigLoadError::Validation(
                "retrieval.max_prompt_tokens must be >= 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semantic::TokenizerSpec;
    use std::io::Write;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let cfg = PolicyQaConfig::from_yaml("version: \"1.0\"\n").unwrap();
        assert_eq!(cfg, PolicyQaConfig::default());
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.embedding.model_id, "amazon.titan-embed-text-v2:0");
        assert_eq!(cfg.generation.model_id, "us.amazon.nova-pro-v1:0");
        assert_eq!(cfg.runtime.region, "us-east-2");
    }

    #[test]
    fn test_load_full_yaml() {
        let yaml = r#"
version: "1"
name: "staging"
runtime:
  region: "ap-south-1"
  endpoint: "http://127.0.0.1:9000"
embedding:
  mode: "stub"
  stub_dimension: 32
  tokenizer:
    kind: "hugging_face"
    path: "/models/tokenizer.json"
index:
  path: "/var/lib/policyqa/index"
generation:
  model_id: "us.amazon.nova-lite-v1:0"
  inference:
    maxTokens: 512
prompt:
  corpus_description: "the cabin crew handbook"
retrieval:
  top_k: 5
  max_prompt_tokens: null
"#;
        let cfg = PolicyQaConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.name.as_deref(), Some("staging"));
        assert_eq!(cfg.runtime.region, "ap-south-1");
        assert_eq!(cfg.runtime.endpoint_url(), "http://127.0.0.1:9000");
        assert_eq!(cfg.embedding.mode, EmbeddingMode::Stub);
        assert_eq!(cfg.embedding.stub_dimension, 32);
        assert!(matches!(cfg.embedding.tokenizer, TokenizerSpec::HuggingFace { .. }));
        assert_eq!(cfg.index.path.to_str(), Some("/var/lib/policyqa/index"));
        assert_eq!(cfg.generation.inference.max_tokens, 512);
        assert_eq!(cfg.generation.inference.top_k, 20);
        assert_eq!(cfg.prompt.corpus_description, "the cabin crew handbook");
        assert_eq!(cfg.retrieval.top_k, 5);
        assert_eq!(cfg.retrieval.max_prompt_tokens, None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "version: \"1.0\"\nretrieval:\n  top_k: 4").unwrap();
        let cfg = PolicyQaConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.retrieval.top_k, 4);
    }

    #[test]
    fn test_missing_file() {
        let err = PolicyQaConfig::from_file("/no/such/policyqa.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileRead(_)));
    }

    #[test]
    fn test_unsupported_version() {
        let err = PolicyQaConfig::from_yaml("version: \"2.0\"").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn test_retrieval_validation() {
        let err = PolicyQaConfig::from_yaml("version: \"1\"\nretrieval:\n  top_k: 0").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));

        let err = PolicyQaConfig::from_yaml("version: \"1\"\nretrieval:\n  max_prompt_tokens: 0")
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn test_embedding_validation() {
        let yaml = "version: \"1\"\nembedding:\n  max_input_tokens: 0";
        let err = PolicyQaConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let cfg = PolicyQaConfig::default();
        let yaml = cfg.to_yaml().unwrap();
        assert_eq!(PolicyQaConfig::from_yaml(&yaml).unwrap(), cfg);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut cfg = PolicyQaConfig::default();
        cfg.runtime.api_key = Some("secret-key".into());
        let yaml = cfg.to_yaml().unwrap();
        assert!(!yaml.contains("secret-key"));
    }
}
