//! Mailbox types: the provider's wire resources and the hydrated domain
//! entities the pipeline works with.

use serde::{Deserialize, Serialize};

// ── Wire resources ──────────────────────────────────────────────────

/// Response of the message listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageRef>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: Option<u64>,
}

/// A full message resource (`format=full`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMessage {
    pub id: String,
    pub thread_id: Option<String>,
    pub label_ids: Vec<String>,
    pub snippet: Option<String>,
    pub payload: Option<RawPart>,
}

/// One node of a message's MIME part tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPart {
    pub part_id: Option<String>,
    pub mime_type: Option<String>,
    pub filename: Option<String>,
    pub headers: Vec<Header>,
    pub body: PartBody,
    pub parts: Vec<RawPart>,
}

impl RawPart {
    /// Filename, if the part carries a non-empty one.
    pub fn named(&self) -> Option<&str> {
        self.filename.as_deref().filter(|f| !f.trim().is_empty())
    }

    pub fn mime(&self) -> &str {
        self.mime_type.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Part body: either inline `data` or an `attachmentId` to fetch separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartBody {
    pub attachment_id: Option<String>,
    pub size: Option<u64>,
    pub data: Option<String>,
}

/// Response of the attachment endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttachmentBody {
    pub size: Option<u64>,
    pub data: String,
}

// ── Domain entities ─────────────────────────────────────────────────

/// A lightweight handle returned by listing, not yet hydrated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl MessageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            thread_id: None,
        }
    }
}

/// A hydrated message, held for the duration of one pipeline pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub date: String,
    pub body: String,
    /// Part tree flattened in document order (root payload excluded).
    pub attachment_parts: Vec<RawPart>,
}

/// A resolved attachment with its decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPart {
    pub filename: String,
    pub mime_type: String,
    pub payload: Vec<u8>,
}
