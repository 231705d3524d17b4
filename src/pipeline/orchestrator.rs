//! Ingestion orchestrator: one pass over the recent window per trigger.
//!
//! Flow per run:
//! 1. Validate the trigger cursor (absent → no-op)
//! 2. Load the dedup ledger once (failure is fatal)
//! 3. List the window (failure ends the run early, with a report), then for
//!    each new message in listing order:
//!    hydrate → summarize → write email row → extract attachments →
//!    summarize + write one document row per attachment
//!
//! Everything after the ledger load is isolated per message: a failure is
//! logged, recorded in the report, and the loop moves on.

use std::sync::Arc;

use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::IngestConfig;
use crate::error::{PipelineError, StoreError};
use crate::mailbox::{AttachmentExtractor, Mailbox, MessageFetcher, MessageRef};
use crate::pipeline::trigger::Trigger;
use crate::pipeline::types::{FailureStage, RunReport, RunState};
use crate::store::{DedupIndex, DocumentRow, EmailRow, ResultWriter, RowStore};
use crate::summarizer::Summarizer;

pub struct IngestionOrchestrator {
    config: IngestConfig,
    fetcher: MessageFetcher,
    extractor: AttachmentExtractor,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn RowStore>,
    writer: ResultWriter,
}

impl IngestionOrchestrator {
    pub fn new(
        config: IngestConfig,
        mailbox: Arc<dyn Mailbox>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn RowStore>,
    ) -> Self {
        Self {
            fetcher: MessageFetcher::new(mailbox.clone(), config.mailbox_scope.clone()),
            extractor: AttachmentExtractor::new(mailbox),
            summarizer,
            writer: ResultWriter::new(store.clone()),
            store,
            config,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run one ingestion pass.
    ///
    /// Only a failure to read the ledger is returned as an error; everything
    /// else ends up in the report.
    pub async fn run(&self, trigger: &Trigger) -> Result<RunReport, PipelineError> {
        let Some(cursor) = trigger.cursor() else {
            info!("Trigger carries no history cursor, nothing to do");
            return Ok(RunReport::new(None).finish());
        };

        let report = RunReport::new(Some(cursor.to_string()));
        let span = info_span!("ingest_run", run_id = %report.run_id, cursor);
        self.run_window(report).instrument(span).await
    }

    async fn run_window(&self, mut report: RunReport) -> Result<RunReport, PipelineError> {
        let mut state = RunState::Idle;
        advance(&mut state, RunState::CursorValidated);
        info!(
            store = %self.config.store_id,
            backend = self.store.backend_name(),
            scope = self.fetcher.scope(),
            window = self.config.window_size,
            "Ingestion run started"
        );

        let mut processed = DedupIndex::load(self.store.as_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load dedup ledger, aborting run");
                PipelineError::LedgerUnavailable(e)
            })?;
        advance(&mut state, RunState::DedupLoaded);

        let refs = match self.fetcher.list_recent(self.config.window_size).await {
            Ok(refs) => refs,
            Err(e) => {
                error!(error = %e, "Failed to list recent messages, ending run");
                report.listing_error = Some(e.to_string());
                Vec::new()
            }
        };
        report.listed = refs.len();

        for msg_ref in &refs {
            if processed.contains(&msg_ref.id) {
                debug!(message_id = %msg_ref.id, "Already processed, skipping");
                report.skipped += 1;
                continue;
            }
            // Claimed before processing so a repeated id gets one attempt per run.
            processed.insert(msg_ref.id.clone());
            self.process_message(msg_ref, &mut state, &mut report).await;
        }

        advance(&mut state, RunState::Done);
        let report = report.finish();
        info!(
            listed = report.listed,
            skipped = report.skipped,
            emails = report.emails_written,
            documents = report.documents_written,
            failures = report.failures.len(),
            "Ingestion run complete"
        );
        Ok(report)
    }

    async fn process_message(
        &self,
        msg_ref: &MessageRef,
        state: &mut RunState,
        report: &mut RunReport,
    ) {
        let id = msg_ref.id.as_str();

        advance(state, RunState::Fetching);
        let message = match self.fetcher.hydrate(msg_ref).await {
            Ok(message) => message,
            Err(e) => {
                warn!(message_id = id, error = %e, "Failed to fetch message");
                report.record_failure(id, FailureStage::Hydrate, e);
                return;
            }
        };

        advance(state, RunState::Summarizing);
        let record = self.summarizer.summarize_email(&message).await;

        advance(state, RunState::Writing);
        let row = EmailRow::new(&message, &record);
        if let Err(e) = self.writer.append_email_row(&row).await {
            match &e {
                StoreError::Duplicate { .. } => {
                    warn!(message_id = id, "Email row already written by a concurrent run")
                }
                _ => warn!(message_id = id, error = %e, "Failed to write email row"),
            }
            report.record_failure(id, FailureStage::WriteEmail, e);
            return;
        }
        report.emails_written += 1;

        advance(state, RunState::AttachmentLoop);
        let extraction = self
            .extractor
            .extract(id, &message.attachment_parts)
            .await;
        for failure in extraction.failures {
            report.record_failure(
                id,
                FailureStage::Attachments,
                format!("{}: {}", failure.filename, failure.error),
            );
        }

        for attachment in &extraction.attachments {
            let record = self.summarizer.summarize_attachment(attachment).await;
            let row = DocumentRow::new(&message, attachment, &record);
            match self.writer.append_document_row(&row).await {
                Ok(()) => report.documents_written += 1,
                Err(e) => {
                    warn!(
                        message_id = id,
                        filename = %attachment.filename,
                        error = %e,
                        "Failed to write document row"
                    );
                    report.record_failure(
                        id,
                        FailureStage::WriteDocument,
                        format!("{}: {e}", attachment.filename),
                    );
                }
            }
        }
    }
}

fn advance(state: &mut RunState, next: RunState) {
    debug!(from = state.label(), to = next.label(), "Run state");
    *state = next;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::MailboxError;
    use crate::mailbox::{AttachmentPart, Message, RawMessage};
    use crate::store::LibSqlStore;
    use crate::summarizer::{DocumentSummaryRecord, EmailSummaryRecord};

    /// Mailbox whose listing can be scripted; every message is attachment-free.
    struct Window {
        ids: Vec<&'static str>,
        list_fails: bool,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl Mailbox for Window {
        async fn list_recent(
            &self,
            _scope: &str,
            limit: usize,
        ) -> Result<Vec<MessageRef>, MailboxError> {
            *self.calls.lock().unwrap() += 1;
            if self.list_fails {
                return Err(MailboxError::Status {
                    operation: "messages.list".into(),
                    status: 503,
                    body: String::new(),
                });
            }
            Ok(self.ids.iter().take(limit).map(|id| MessageRef::new(*id)).collect())
        }

        async fn get_full(&self, id: &str) -> Result<RawMessage, MailboxError> {
            *self.calls.lock().unwrap() += 1;
            Ok(RawMessage {
                id: id.to_string(),
                ..Default::default()
            })
        }

        async fn get_attachment(&self, _m: &str, _a: &str) -> Result<String, MailboxError> {
            unreachable!()
        }
    }

    struct Echo;

    #[async_trait]
    impl Summarizer for Echo {
        async fn summarize_email(&self, message: &Message) -> EmailSummaryRecord {
            EmailSummaryRecord::degraded(message)
        }

        async fn summarize_attachment(&self, _a: &AttachmentPart) -> DocumentSummaryRecord {
            DocumentSummaryRecord::degraded()
        }
    }

    async fn orchestrator(
        window: Arc<Window>,
        window_size: usize,
    ) -> (IngestionOrchestrator, Arc<LibSqlStore>) {
        let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
        let config = IngestConfig::new(":memory:").with_window_size(window_size);
        (
            IngestionOrchestrator::new(config, window, Arc::new(Echo), store.clone()),
            store,
        )
    }

    fn window(ids: Vec<&'static str>) -> Arc<Window> {
        Arc::new(Window {
            ids,
            list_fails: false,
            calls: Mutex::new(0),
        })
    }

    #[tokio::test]
    async fn missing_cursor_is_a_no_op() {
        let mailbox = window(vec!["a"]);
        let (orch, store) = orchestrator(mailbox.clone(), 5).await;

        let report = orch.run(&Trigger::empty()).await.unwrap();
        assert!(!report.ran());
        assert_eq!(report.listed, 0);
        assert_eq!(*mailbox.calls.lock().unwrap(), 0);
        assert!(store.read_message_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn window_size_bounds_listing() {
        let (orch, store) = orchestrator(window(vec!["a", "b", "c"]), 2).await;
        let report = orch.run(&Trigger::new("1")).await.unwrap();
        assert_eq!(report.listed, 2);
        assert_eq!(store.read_message_ids().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn repeated_id_in_window_is_written_once() {
        let (orch, store) = orchestrator(window(vec!["a", "a", "b"]), 5).await;
        let report = orch.run(&Trigger::new("1")).await.unwrap();
        assert_eq!(report.emails_written, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.read_message_ids().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn listing_failure_ends_run_with_report() {
        let mailbox = Arc::new(Window {
            ids: vec!["a"],
            list_fails: true,
            calls: Mutex::new(0),
        });
        let (orch, store) = orchestrator(mailbox.clone(), 5).await;

        let report = orch.run(&Trigger::new("1")).await.unwrap();
        assert_eq!(report.listed, 0);
        assert_eq!(report.emails_written, 0);
        assert!(report.failures.is_empty());
        assert!(report.finished_at.is_some());
        assert!(report.listing_error.as_deref().unwrap().contains("HTTP 503"));
        assert_eq!(*mailbox.calls.lock().unwrap(), 1);
        assert!(store.read_message_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_carries_cursor() {
        let (orch, _store) = orchestrator(window(vec![]), 5).await;
        let report = orch.run(&Trigger::new("777")).await.unwrap();
        assert_eq!(report.cursor.as_deref(), Some("777"));
        assert!(report.finished_at.is_some());
    }
}
