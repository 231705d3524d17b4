//! Attachment extraction. Resolves each named part's payload either from
//! inline data or by a secondary fetch keyed by `(message_id, attachment_id)`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::MailboxError;
use crate::mailbox::Mailbox;
use crate::mailbox::encoding::decode_base64url;
use crate::mailbox::types::{AttachmentPart, RawPart};

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// An attachment that was named but could not be resolved.
#[derive(Debug)]
pub struct AttachmentFailure {
    pub filename: String,
    pub error: MailboxError,
}

/// Result of extracting one message's attachments.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Resolved attachments, in part order.
    pub attachments: Vec<AttachmentPart>,
    /// Attachments whose fetch or decode failed. Siblings are unaffected.
    pub failures: Vec<AttachmentFailure>,
}

/// How a part's payload is to be resolved.
enum Source<'a> {
    Inline(&'a str),
    Reference(&'a str),
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn payload_source(part: &RawPart) -> Option<Source<'_>> {
    if let Some(data) = non_empty(&part.body.data) {
        return Some(Source::Inline(data));
    }
    non_empty(&part.body.attachment_id).map(Source::Reference)
}

pub struct AttachmentExtractor {
    mailbox: Arc<dyn Mailbox>,
}

impl AttachmentExtractor {
    pub fn new(mailbox: Arc<dyn Mailbox>) -> Self {
        Self { mailbox }
    }

    /// Resolve every named part of a message, one at a time, in order.
    ///
    /// Parts without a filename are skipped. Parts with neither inline data
    /// nor an attachment reference are dropped silently.
    pub async fn extract(&self, message_id: &str, parts: &[RawPart]) -> Extraction {
        let mut extraction = Extraction::default();

        for part in parts {
            let Some(filename) = part.named() else {
                continue;
            };
            let Some(source) = payload_source(part) else {
                debug!(message_id, filename, "Attachment has no payload, skipping");
                continue;
            };

            match self.resolve(message_id, source).await {
                Ok(payload) if payload.is_empty() => {
                    debug!(message_id, filename, "Attachment payload empty, skipping");
                }
                Ok(payload) => {
                    let mime_type = part
                        .mime_type
                        .as_deref()
                        .filter(|m| !m.is_empty())
                        .unwrap_or(DEFAULT_MIME_TYPE)
                        .to_string();
                    extraction.attachments.push(AttachmentPart {
                        filename: filename.to_string(),
                        mime_type,
                        payload,
                    });
                }
                Err(error) => {
                    warn!(message_id, filename, error = %error, "Failed to resolve attachment");
                    extraction.failures.push(AttachmentFailure {
                        filename: filename.to_string(),
                        error,
                    });
                }
            }
        }

        extraction
    }

    async fn resolve(&self, message_id: &str, source: Source<'_>) -> Result<Vec<u8>, MailboxError> {
        match source {
            Source::Inline(data) => decode_base64url(data),
            Source::Reference(attachment_id) => {
                let data = self
                    .mailbox
                    .get_attachment(message_id, attachment_id)
                    .await?;
                decode_base64url(&data)
            }
        }
    }
}
