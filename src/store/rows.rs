//! Fixed-shape rows for the Emails and Documents tables.
//!
//! Column order is part of the storage contract; `cells()` is the only
//! place it is defined.

use serde::Serialize;

use crate::mailbox::{AttachmentPart, Message};
use crate::summarizer::{DocumentSummaryRecord, EmailSummaryRecord};

/// Web link that opens a message in the mail client.
pub fn deep_link(message_id: &str) -> String {
    format!("https://mail.google.com/mail/u/0/#inbox/{message_id}")
}

/// One row of the Emails table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailRow {
    pub date: String,
    pub sender: String,
    pub subject: String,
    pub summary: String,
    pub tag: String,
    pub action_required: String,
    pub deep_link_url: String,
    pub message_id: String,
}

impl EmailRow {
    /// Date, sender and subject come from the message headers, so both
    /// tables agree on them whatever the model answered.
    pub fn new(message: &Message, record: &EmailSummaryRecord) -> Self {
        Self {
            date: message.date.clone(),
            sender: message.sender.clone(),
            subject: message.subject.clone(),
            summary: record.summary.clone(),
            tag: record.tag.clone(),
            action_required: record.action_required.clone(),
            deep_link_url: deep_link(&message.id),
            message_id: message.id.clone(),
        }
    }

    pub fn cells(&self) -> [&str; 8] {
        [
            &self.date,
            &self.sender,
            &self.subject,
            &self.summary,
            &self.tag,
            &self.action_required,
            &self.deep_link_url,
            &self.message_id,
        ]
    }
}

/// One row of the Documents table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRow {
    pub filename: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub summary: String,
    /// Empty when the document carries no total.
    pub total: String,
    pub date: String,
    pub deep_link_url: String,
}

impl DocumentRow {
    pub fn new(
        message: &Message,
        attachment: &AttachmentPart,
        record: &DocumentSummaryRecord,
    ) -> Self {
        Self {
            filename: attachment.filename.clone(),
            subject: message.subject.clone(),
            doc_type: record.doc_type.clone(),
            summary: record.summary.clone(),
            total: record.total.clone().unwrap_or_default(),
            date: record.date.clone().unwrap_or_default(),
            deep_link_url: deep_link(&message.id),
        }
    }

    pub fn cells(&self) -> [&str; 7] {
        [
            &self.filename,
            &self.subject,
            &self.doc_type,
            &self.summary,
            &self.total,
            &self.date,
            &self.deep_link_url,
        ]
    }
}
