//! Tabular result store: the durable Emails/Documents tables plus the
//! dedup ledger read from them.

pub mod dedup;
pub mod libsql_backend;
pub mod migrations;
pub mod rows;
pub mod sheets;
pub mod writer;

pub use dedup::DedupIndex;
pub use libsql_backend::LibSqlStore;
pub use rows::{DocumentRow, EmailRow, deep_link};
pub use sheets::SheetsStore;
pub use writer::ResultWriter;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;

/// Backend-agnostic row store, bound to one store id at construction.
#[async_trait]
pub trait RowStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Message-id column of the Emails table, in append order, header excluded.
    async fn read_message_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Append exactly one row to the Emails table.
    async fn append_email_row(&self, row: &EmailRow) -> Result<(), StoreError>;

    /// Append exactly one row to the Documents table.
    async fn append_document_row(&self, row: &DocumentRow) -> Result<(), StoreError>;
}

/// Open the configured backend for `store_id`.
pub async fn create_store(
    config: &StoreConfig,
    store_id: &str,
) -> Result<Arc<dyn RowStore>, StoreError> {
    match config.backend {
        StoreBackend::LibSql => {
            let store = LibSqlStore::from_store_id(store_id).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Sheets => {
            let token = config.sheets_access_token.clone().ok_or_else(|| {
                StoreError::Config("the sheets backend needs an access token".into())
            })?;
            tracing::info!(
                spreadsheet = store_id,
                documents_tab = %config.sheets_documents_tab,
                "Using Google Sheets store"
            );
            let store = SheetsStore::new(&config.sheets_api_base, store_id, token)
                .with_documents_tab(&config.sheets_documents_tab);
            Ok(Arc::new(store))
        }
    }
}
