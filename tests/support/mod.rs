//! Hand-written fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use inbox_digest::config::IngestConfig;
use inbox_digest::error::{MailboxError, StoreError};
use inbox_digest::mailbox::encoding::encode_base64url;
use inbox_digest::mailbox::types::{Header, PartBody};
use inbox_digest::mailbox::{AttachmentPart, Mailbox, Message, MessageRef, RawMessage, RawPart};
use inbox_digest::pipeline::IngestionOrchestrator;
use inbox_digest::store::{DocumentRow, EmailRow, RowStore};
use inbox_digest::summarizer::{DocumentSummaryRecord, EmailSummaryRecord, Summarizer};

// ── Message builders ────────────────────────────────────────────────

pub fn header(name: &str, value: &str) -> Header {
    Header {
        name: name.into(),
        value: value.into(),
    }
}

pub fn text_part(text: &str) -> RawPart {
    RawPart {
        mime_type: Some("text/plain".into()),
        body: PartBody {
            data: Some(encode_base64url(text.as_bytes())),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn inline_attachment(filename: &str, mime: &str, bytes: &[u8]) -> RawPart {
    RawPart {
        mime_type: Some(mime.into()),
        filename: Some(filename.into()),
        body: PartBody {
            data: Some(encode_base64url(bytes)),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn referenced_attachment(filename: &str, mime: &str, attachment_id: &str) -> RawPart {
    RawPart {
        mime_type: Some(mime.into()),
        filename: Some(filename.into()),
        body: PartBody {
            attachment_id: Some(attachment_id.into()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A named part with neither inline data nor an attachment id.
pub fn bare_attachment(filename: &str) -> RawPart {
    RawPart {
        mime_type: Some("application/pdf".into()),
        filename: Some(filename.into()),
        ..Default::default()
    }
}

pub fn raw_message(id: &str, subject: &str, parts: Vec<RawPart>) -> RawMessage {
    RawMessage {
        id: id.into(),
        snippet: Some(format!("snippet of {id}")),
        payload: Some(RawPart {
            mime_type: Some("multipart/mixed".into()),
            headers: vec![
                header("Subject", subject),
                header("From", "sender@example.test"),
                header("Date", "Wed, 5 Mar 2025 08:30:00 +0000"),
            ],
            parts,
            ..Default::default()
        }),
        ..Default::default()
    }
}

// ── Mailbox ─────────────────────────────────────────────────────────

/// In-memory mailbox that logs every call in order.
#[derive(Default)]
pub struct FakeMailbox {
    listing: Vec<String>,
    messages: HashMap<String, RawMessage>,
    attachments: HashMap<(String, String), String>,
    failing_messages: HashSet<String>,
    failing_attachments: HashSet<String>,
    failing_listing: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the end of the listing.
    pub fn with_message(mut self, message: RawMessage) -> Self {
        self.listing.push(message.id.clone());
        self.messages.insert(message.id.clone(), message);
        self
    }

    /// List an id that fails to hydrate.
    pub fn with_broken_message(mut self, id: &str) -> Self {
        self.listing.push(id.into());
        self.failing_messages.insert(id.into());
        self
    }

    pub fn with_attachment(mut self, message_id: &str, attachment_id: &str, bytes: &[u8]) -> Self {
        self.attachments.insert(
            (message_id.into(), attachment_id.into()),
            encode_base64url(bytes),
        );
        self
    }

    /// Make `list_recent` fail.
    pub fn failing_listing(mut self) -> Self {
        self.failing_listing = true;
        self
    }

    pub fn with_broken_attachment(mut self, attachment_id: &str) -> Self {
        self.failing_attachments.insert(attachment_id.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Mailbox for FakeMailbox {
    async fn list_recent(
        &self,
        scope: &str,
        limit: usize,
    ) -> Result<Vec<MessageRef>, MailboxError> {
        self.log(format!("list:{scope}:{limit}"));
        if self.failing_listing {
            return Err(MailboxError::Status {
                operation: "messages.list".into(),
                status: 503,
                body: "backend unavailable".into(),
            });
        }
        Ok(self
            .listing
            .iter()
            .take(limit)
            .map(|id| MessageRef::new(id.as_str()))
            .collect())
    }

    async fn get_full(&self, id: &str) -> Result<RawMessage, MailboxError> {
        self.log(format!("get:{id}"));
        if self.failing_messages.contains(id) {
            return Err(MailboxError::Status {
                operation: format!("messages.get({id})"),
                status: 500,
                body: "backend error".into(),
            });
        }
        self.messages
            .get(id)
            .cloned()
            .ok_or_else(|| MailboxError::NotFound {
                operation: format!("messages.get({id})"),
            })
    }

    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<String, MailboxError> {
        self.log(format!("attachment:{message_id}/{attachment_id}"));
        if self.failing_attachments.contains(attachment_id) {
            return Err(MailboxError::RequestFailed {
                operation: "attachments.get".into(),
                reason: "connection reset".into(),
            });
        }
        self.attachments
            .get(&(message_id.to_string(), attachment_id.to_string()))
            .cloned()
            .ok_or_else(|| MailboxError::NotFound {
                operation: "attachments.get".into(),
            })
    }
}

// ── Summarizer ──────────────────────────────────────────────────────

/// Deterministic summarizer that logs what it was asked to summarize.
#[derive(Default)]
pub struct FakeSummarizer {
    pub calls: Mutex<Vec<String>>,
    /// Answer with a subject and sender of the model's own making.
    rewrite_headers: bool,
}

impl FakeSummarizer {
    pub fn rewriting_headers() -> Self {
        Self {
            rewrite_headers: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize_email(&self, message: &Message) -> EmailSummaryRecord {
        self.calls.lock().unwrap().push(format!("email:{}", message.id));
        let (subject, sender) = if self.rewrite_headers {
            ("model subject".to_string(), "Model Sender".to_string())
        } else {
            (message.subject.clone(), message.sender.clone())
        };
        EmailSummaryRecord {
            subject,
            sender,
            summary: format!("summary of {}", message.subject),
            tag: "Work".into(),
            action_required: "no".into(),
            next_action: None,
            suggested_reply: None,
        }
    }

    async fn summarize_attachment(&self, attachment: &AttachmentPart) -> DocumentSummaryRecord {
        self.calls
            .lock()
            .unwrap()
            .push(format!("attachment:{}", attachment.filename));
        DocumentSummaryRecord {
            doc_type: "invoice".into(),
            summary: format!("{} ({} bytes)", attachment.filename, attachment.payload.len()),
            total: Some("$12.00".into()),
            date: None,
        }
    }
}

// ── Store ───────────────────────────────────────────────────────────

/// Row store that records writes in order and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    seeded_ids: Vec<String>,
    fail_read: bool,
    fail_email_for: HashSet<String>,
    fail_document_for: HashSet<String>,
    pub emails: Mutex<Vec<EmailRow>>,
    pub documents: Mutex<Vec<DocumentRow>>,
    /// Every write attempt, in order: "email:<id>" or "document:<filename>".
    pub writes: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_processed(mut self, ids: &[&str]) -> Self {
        self.seeded_ids = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn failing_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    pub fn failing_email(mut self, message_id: &str) -> Self {
        self.fail_email_for.insert(message_id.into());
        self
    }

    pub fn failing_document(mut self, filename: &str) -> Self {
        self.fail_document_for.insert(filename.into());
        self
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn email_ids(&self) -> Vec<String> {
        self.emails
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.message_id.clone())
            .collect()
    }

    pub fn document_files(&self) -> Vec<String> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.filename.clone())
            .collect()
    }
}

#[async_trait]
impl RowStore for RecordingStore {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn read_message_ids(&self) -> Result<Vec<String>, StoreError> {
        if self.fail_read {
            return Err(StoreError::Status {
                status: 503,
                body: "store unavailable".into(),
            });
        }
        let mut ids = self.seeded_ids.clone();
        ids.extend(self.email_ids());
        Ok(ids)
    }

    async fn append_email_row(&self, row: &EmailRow) -> Result<(), StoreError> {
        self.writes
            .lock()
            .unwrap()
            .push(format!("email:{}", row.message_id));
        if self.fail_email_for.contains(&row.message_id) {
            return Err(StoreError::Status {
                status: 500,
                body: "append failed".into(),
            });
        }
        self.emails.lock().unwrap().push(row.clone());
        Ok(())
    }

    async fn append_document_row(&self, row: &DocumentRow) -> Result<(), StoreError> {
        self.writes
            .lock()
            .unwrap()
            .push(format!("document:{}", row.filename));
        if self.fail_document_for.contains(&row.filename) {
            return Err(StoreError::Status {
                status: 500,
                body: "append failed".into(),
            });
        }
        self.documents.lock().unwrap().push(row.clone());
        Ok(())
    }
}

// ── Wiring ──────────────────────────────────────────────────────────

pub fn orchestrator(
    mailbox: Arc<FakeMailbox>,
    summarizer: Arc<FakeSummarizer>,
    store: Arc<dyn RowStore>,
) -> IngestionOrchestrator {
    IngestionOrchestrator::new(IngestConfig::new("test-store"), mailbox, summarizer, store)
}
