//! Summarization of emails and attachments.
//!
//! Summarizers never fail from the caller's point of view: transport errors,
//! blocked candidates and unparseable output all collapse into a degraded
//! record so the pipeline keeps writing rows.

pub mod prompts;
pub mod records;

pub use records::{
    DEGRADED_DOCUMENT_SUMMARY, DEGRADED_EMAIL_SUMMARY, DocumentSummaryRecord, EmailSummaryRecord,
    UNKNOWN,
};

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::{CompletionRequest, ContentPart, LlmProvider};
use crate::mailbox::{AttachmentPart, Message};

/// Produces structured summaries. Implementations must not fail.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize_email(&self, message: &Message) -> EmailSummaryRecord;

    async fn summarize_attachment(&self, attachment: &AttachmentPart) -> DocumentSummaryRecord;
}

/// Summarizer backed by a generative model.
pub struct LlmSummarizer {
    llm: Arc<dyn LlmProvider>,
    max_body_chars: usize,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn LlmProvider>, max_body_chars: usize) -> Self {
        Self {
            llm,
            max_body_chars,
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, String> {
        self.llm
            .complete(request)
            .await
            .map(|r| r.content)
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize_email(&self, message: &Message) -> EmailSummaryRecord {
        let request = CompletionRequest::new(vec![
            ContentPart::text(prompts::build_email_content(message, self.max_body_chars)),
            ContentPart::text(prompts::EMAIL_INSTRUCTION),
        ])
        .with_response_schema(prompts::email_response_schema())
        .with_temperature(0.2);

        let outcome = match self.complete(request).await {
            Ok(raw) => prompts::parse_email_response(&raw, message),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(record) => {
                tracing::debug!(message_id = %message.id, tag = %record.tag, "Email summarized");
                record
            }
            Err(e) => {
                tracing::warn!(
                    message_id = %message.id,
                    model = %self.llm.model_name(),
                    "Email summarization failed, writing degraded record: {e}"
                );
                EmailSummaryRecord::degraded(message)
            }
        }
    }

    async fn summarize_attachment(&self, attachment: &AttachmentPart) -> DocumentSummaryRecord {
        let request = CompletionRequest::new(vec![
            ContentPart::inline(
                prompts::attachment_mime(attachment),
                attachment.payload.clone(),
            ),
            ContentPart::text(prompts::attachment_instruction(&attachment.filename)),
        ])
        .with_response_schema(prompts::document_response_schema())
        .with_temperature(0.2);

        let outcome = match self.complete(request).await {
            Ok(raw) => prompts::parse_document_response(&raw),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    filename = %attachment.filename,
                    model = %self.llm.model_name(),
                    "Attachment analysis failed, writing degraded record: {e}"
                );
                DocumentSummaryRecord::degraded()
            }
        }
    }
}
