//! Summary records produced by the summarizer.

use serde::{Deserialize, Serialize};

use crate::mailbox::Message;

/// Summary written when email summarization fails internally.
pub const DEGRADED_EMAIL_SUMMARY: &str = "(Error generating summary)";

/// Summary written when attachment analysis fails internally.
pub const DEGRADED_DOCUMENT_SUMMARY: &str = "Unable to analyze";

/// Classification marker for anything the model could not decide.
pub const UNKNOWN: &str = "unknown";

/// Structured summary of one email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSummaryRecord {
    pub subject: String,
    pub sender: String,
    /// One-line summary.
    pub summary: String,
    /// One main mailbox tag, e.g. "Finance".
    pub tag: String,
    /// "yes"/"no" plus what, or "unknown".
    pub action_required: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_reply: Option<String>,
}

impl EmailSummaryRecord {
    /// Record used when the model call or its output is unusable.
    pub fn degraded(message: &Message) -> Self {
        Self {
            subject: message.subject.clone(),
            sender: message.sender.clone(),
            summary: DEGRADED_EMAIL_SUMMARY.to_string(),
            tag: String::new(),
            action_required: UNKNOWN.to_string(),
            next_action: None,
            suggested_reply: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.summary == DEGRADED_EMAIL_SUMMARY
    }
}

/// Structured analysis of one attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummaryRecord {
    /// Macro classification of the document (invoice, receipt, contract...).
    #[serde(rename = "type")]
    pub doc_type: String,
    pub summary: String,
    /// Total amount, when the document carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl DocumentSummaryRecord {
    pub fn degraded() -> Self {
        Self {
            doc_type: UNKNOWN.to_string(),
            summary: DEGRADED_DOCUMENT_SUMMARY.to_string(),
            total: None,
            date: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.summary == DEGRADED_DOCUMENT_SUMMARY
    }
}
