//! Gemini `generateContent` provider over plain REST.
//!
//! Text and binary parts go in a single user turn; when a response schema is
//! present the request pins `responseMimeType` to JSON.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, ContentPart, FinishReason, LlmProvider,
};

const PROVIDER: &str = "gemini";

/// How requests are authenticated.
#[derive(Debug, Clone)]
pub enum GeminiAuth {
    /// `x-goog-api-key` header (AI Studio keys).
    ApiKey(SecretString),
    /// OAuth bearer token (Vertex / service accounts).
    Bearer(SecretString),
}

pub struct GeminiProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    auth: GeminiAuth,
}

impl GeminiProvider {
    pub fn new(endpoint: &str, model: &str, auth: GeminiAuth) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            auth,
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = build_request_body(&request);
        let builder = self.client.post(self.url()).json(&body);
        let builder = match &self.auth {
            GeminiAuth::ApiKey(key) => builder.header("x-goog-api-key", key.expose_secret()),
            GeminiAuth::Bearer(token) => builder.bearer_auth(token.expose_secret()),
        };

        let resp = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.into(),
            reason: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse =
            resp.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })?;
        let response = into_completion(parsed)?;

        tracing::debug!(
            model = %self.model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Gemini completion finished"
        );
        Ok(response)
    }
}

/// Build the JSON body for `generateContent`.
pub fn build_request_body(request: &CompletionRequest) -> Value {
    let parts: Vec<Value> = request
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::Text(text) => json!({ "text": text }),
            ContentPart::InlineData { mime_type, data } => json!({
                "inlineData": {
                    "mimeType": mime_type,
                    "data": STANDARD.encode(data),
                }
            }),
        })
        .collect();

    let mut generation_config = serde_json::Map::new();
    if let Some(schema) = &request.response_schema {
        generation_config.insert("responseMimeType".into(), json!("application/json"));
        generation_config.insert("responseSchema".into(), schema.clone());
    }
    if let Some(t) = request.temperature {
        generation_config.insert("temperature".into(), json!(t));
    }

    let mut body = json!({
        "contents": [{ "role": "user", "parts": parts }],
    });
    if !generation_config.is_empty() {
        body["generationConfig"] = Value::Object(generation_config);
    }
    body
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: u32,
    candidates_token_count: u32,
}

/// Collapse the first candidate's text parts into a completion.
pub fn into_completion(resp: GenerateContentResponse) -> Result<CompletionResponse, LlmError> {
    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::EmptyResponse {
            provider: PROVIDER.into(),
        })?;

    let content: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let finish_reason = match candidate.finish_reason.as_deref() {
        Some("STOP") | None => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => FinishReason::Safety,
        Some(_) => FinishReason::Other,
    };

    if content.trim().is_empty() {
        return Err(LlmError::InvalidResponse {
            provider: PROVIDER.into(),
            reason: format!("candidate has no text (finish reason {finish_reason:?})"),
        });
    }

    let usage = resp.usage_metadata.unwrap_or_default();
    Ok(CompletionResponse {
        content,
        input_tokens: usage.prompt_token_count,
        output_tokens: usage.candidates_token_count,
        finish_reason,
    })
}
