//! LLM integration for inbox-digest.
//!
//! The summarizer talks to a generative model through the `LlmProvider`
//! trait. The only shipped backend is Gemini's `generateContent` REST API,
//! which accepts binary attachments inline and supports schema-constrained
//! JSON output.

pub mod gemini;
pub mod provider;

pub use gemini::{GeminiAuth, GeminiProvider};
pub use provider::*;

use std::sync::Arc;

use crate::config::SummarizerConfig;
use crate::error::LlmError;

/// Create an LLM provider from configuration.
///
/// An API key wins over an access token when both are configured.
pub fn create_provider(config: &SummarizerConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let auth = match (&config.api_key, &config.access_token) {
        (Some(key), _) => GeminiAuth::ApiKey(key.clone()),
        (None, Some(token)) => GeminiAuth::Bearer(token.clone()),
        (None, None) => {
            return Err(LlmError::RequestFailed {
                provider: "gemini".to_string(),
                reason: "no API key or access token configured".to_string(),
            });
        }
    };

    tracing::info!("Using Gemini (model: {})", config.model);
    Ok(Arc::new(GeminiProvider::new(
        &config.endpoint,
        &config.model,
        auth,
    )))
}
