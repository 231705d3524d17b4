//! Mailbox access: the read surface of the mail provider plus the two
//! pipeline components built on it (message fetching and attachment
//! extraction).

pub mod attachments;
pub mod encoding;
pub mod fetcher;
pub mod gmail;
pub mod types;

pub use attachments::{AttachmentExtractor, AttachmentFailure, Extraction};
pub use fetcher::MessageFetcher;
pub use gmail::GmailClient;
pub use types::{AttachmentPart, Message, MessageRef, RawMessage, RawPart};

use async_trait::async_trait;

use crate::error::MailboxError;

/// Read surface of the mailbox provider.
///
/// Each call is a single blocking request from the pipeline's point of view.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// List the most recent `limit` messages in `scope` (label/folder),
    /// newest first.
    async fn list_recent(&self, scope: &str, limit: usize)
    -> Result<Vec<MessageRef>, MailboxError>;

    /// Fetch a message with headers, body and the full part tree.
    async fn get_full(&self, id: &str) -> Result<RawMessage, MailboxError>;

    /// Fetch an attachment body. Returns the transport-encoded data.
    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<String, MailboxError>;
}
