use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which embedder implementation to build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMode {
    /// Call the hosted embedding model through the model runtime.
    #[default]
    Bedrock,
    /// Deterministic hash-seeded vectors; no network. For offline work and tests.
    Stub,
}

/// Tokenizer used to bound input length before embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenizerSpec {
    /// OpenAI `cl100k_base` BPE, bundled with `tiktoken-rs`.
    #[default]
    Cl100kBase,
    /// A HuggingFace `tokenizer.json` on disk.
    HuggingFace { path: PathBuf },
}

/// Runtime configuration for the embedding adapter.
///
/// # Example
/// ```
/// use semantic::{EmbeddingMode, SemanticConfig};
///
/// let cfg = SemanticConfig {
///     mode: EmbeddingMode::Stub,
///     stub_dimension: 8,
///     ..Default::default()
/// };
/// assert_eq!(cfg.max_input_tokens, 8000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    pub mode: EmbeddingMode,
    /// Hosted model identifier. Also recorded in the index manifest, so the
    /// stub uses it too.
    pub model_id: String,
    /// Inputs longer than this many tokens are cut before being sent.
    pub max_input_tokens: usize,
    pub tokenizer: TokenizerSpec,
    /// L2-normalize vectors after they come back.
    pub normalize: bool,
    /// Vector length produced by [`EmbeddingMode::Stub`].
    pub stub_dimension: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Bedrock,
            model_id: "amazon.titan-embed-text-v2:0".into(),
            max_input_tokens: 8000,
            tokenizer: TokenizerSpec::Cl100kBase,
            normalize: false,
            stub_dimension: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = SemanticConfig::default();
        assert_eq!(cfg.mode, EmbeddingMode::Bedrock);
        assert_eq!(cfg.model_id, "amazon.titan-embed-text-v2:0");
        assert_eq!(cfg.max_input_tokens, 8000);
        assert_eq!(cfg.tokenizer, TokenizerSpec::Cl100kBase);
        assert!(!cfg.normalize);
        assert_eq!(cfg.stub_dimension, 1024);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: SemanticConfig =
            serde_json::from_str(r#"{"mode": "stub", "stub_dimension": 16}"#).unwrap();
        assert_eq!(cfg.mode, EmbeddingMode::Stub);
        assert_eq!(cfg.stub_dimension, 16);
        assert_eq!(cfg.max_input_tokens, 8000);
    }

    #[test]
    fn tokenizer_spec_is_tagged() {
        let spec: TokenizerSpec =
            serde_json::from_str(r#"{"kind": "hugging_face", "path": "/models/tokenizer.json"}"#)
                .unwrap();
        assert_eq!(
            spec,
            TokenizerSpec::HuggingFace {
                path: PathBuf::from("/models/tokenizer.json")
            }
        );

        let default: TokenizerSpec = serde_json::from_str(r#"{"kind": "cl100k_base"}"#).unwrap();
        assert_eq!(default, TokenizerSpec::Cl100kBase);
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = SemanticConfig {
            mode: EmbeddingMode::Stub,
            model_id: "test-model".into(),
            max_input_tokens: 512,
            tokenizer: TokenizerSpec::HuggingFace {
                path: PathBuf::from("tok.json"),
            },
            normalize: true,
            stub_dimension: 32,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SemanticConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
