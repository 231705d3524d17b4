//! Shared types for the ingestion pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// ── Run state ───────────────────────────────────────────────────────

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    CursorValidated,
    DedupLoaded,
    Fetching,
    Summarizing,
    Writing,
    AttachmentLoop,
    Done,
}

impl RunState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CursorValidated => "cursor_validated",
            Self::DedupLoaded => "dedup_loaded",
            Self::Fetching => "fetching",
            Self::Summarizing => "summarizing",
            Self::Writing => "writing",
            Self::AttachmentLoop => "attachment_loop",
            Self::Done => "done",
        }
    }
}

// ── Failures ────────────────────────────────────────────────────────

/// Step at which a message-level failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Hydrate,
    WriteEmail,
    Attachments,
    WriteDocument,
}

/// A recorded, non-fatal failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFailure {
    pub message_id: String,
    pub stage: FailureStage,
    pub error: String,
}

// ── Report ──────────────────────────────────────────────────────────

/// Per-invocation tally of skipped, written and failed items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub cursor: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub listed: usize,
    pub skipped: usize,
    pub emails_written: usize,
    pub documents_written: usize,
    pub failures: Vec<MessageFailure>,
    /// Set when the window could not be listed; nothing was processed.
    pub listing_error: Option<String>,
}

impl RunReport {
    pub fn new(cursor: Option<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            cursor,
            started_at: Utc::now(),
            finished_at: None,
            listed: 0,
            skipped: 0,
            emails_written: 0,
            documents_written: 0,
            failures: Vec::new(),
            listing_error: None,
        }
    }

    /// Whether the run did anything beyond validating the trigger.
    pub fn ran(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn record_failure(
        &mut self,
        message_id: &str,
        stage: FailureStage,
        error: impl std::fmt::Display,
    ) {
        self.failures.push(MessageFailure {
            message_id: message_id.to_string(),
            stage,
            error: error.to_string(),
        });
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}
