//! Ingestion pipeline.
//!
//! A change notification (`Trigger`) starts one pass of the
//! `IngestionOrchestrator` over the most recent window of the mailbox:
//! dedup against the store, summarize each new message and its
//! attachments, and append the results as rows.

pub mod orchestrator;
pub mod trigger;
pub mod types;

pub use orchestrator::IngestionOrchestrator;
pub use trigger::Trigger;
pub use types::{FailureStage, MessageFailure, RunReport, RunState};
