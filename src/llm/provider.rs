//! Provider-neutral completion types and the `LlmProvider` trait.

use async_trait::async_trait;

use crate::error::LlmError;

/// One piece of request content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// Binary content sent alongside the instruction (documents, images).
    InlineData { mime_type: String, data: Vec<u8> },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// A single-turn completion request.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub parts: Vec<ContentPart>,
    /// When set, the provider is asked for JSON conforming to this schema.
    pub response_schema: Option<serde_json::Value>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(parts: Vec<ContentPart>) -> Self {
        Self {
            parts,
            ..Default::default()
        }
    }

    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Safety,
    Other,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: FinishReason,
}

/// A generative model backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
