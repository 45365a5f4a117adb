//! messages-v1 request and response bodies.

use serde::{Deserialize, Serialize};

use crate::config::InferenceParams;
use crate::GenerateError;

pub const SCHEMA_VERSION: &str = "messages-v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationRequest<'a> {
    pub schema_version: &'static str,
    pub messages: Vec<Message>,
    pub system: Vec<ContentBlock>,
    pub inference_config: &'a InferenceParams,
}

impl<'a> GenerationRequest<'a> {
    /// A single user turn carrying `prompt`.
    pub fn single_turn(prompt: &str, system: &str, inference: &'a InferenceParams) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            messages: vec![Message {
                role: "user".into(),
                content: vec![ContentBlock::text(prompt)],
            }],
            system: vec![ContentBlock::text(system)],
            inference_config: inference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOutput {
    pub message: Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetrics {
    pub latency_ms: u64,
}

/// The full envelope returned by the chat model.
///
/// A decoded response always has at least one content block with text, so
/// [`GenerationResponse::text`] never comes up empty-handed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub output: ResponseOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ResponseMetrics>,
}

impl GenerationResponse {
    /// Decode and validate a raw response body.
    pub fn from_slice(raw: &[u8]) -> Result<Self, GenerateError> {
        let response: GenerationResponse = serde_json::from_slice(raw)
            .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;
        match response.output.message.content.first() {
            None => Err(GenerateError::MalformedResponse(
                "output.message.content is empty".into(),
            )),
            Some(block) if block.text.is_none() => Err(GenerateError::MalformedResponse(
                "first content block has no text".into(),
            )),
            Some(_) => Ok(response),
        }
    }

    /// Text of the first content block.
    pub fn text(&self) -> &str {
        self.output
            .message
            .content
            .first()
            .and_then(|block| block.text.as_deref())
            .unwrap_or_default()
    }

    /// Build a response carrying `text`, as the model would.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            output: ResponseOutput {
                message: Message {
                    role: "assistant".into(),
                    content: vec![ContentBlock::text(text)],
                },
            },
            stop_reason: Some("end_turn".into()),
            usage: Usage::default(),
            metrics: None,
        }
    }
}
