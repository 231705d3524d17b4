//! Appends completed records to the store, one row per call.

use std::sync::Arc;

use crate::error::StoreError;
use crate::store::{DocumentRow, EmailRow, RowStore};

pub struct ResultWriter {
    store: Arc<dyn RowStore>,
}

impl ResultWriter {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub async fn append_email_row(&self, row: &EmailRow) -> Result<(), StoreError> {
        self.store.append_email_row(row).await?;
        tracing::info!(
            message_id = %row.message_id,
            tag = %row.tag,
            "Email row written"
        );
        Ok(())
    }

    pub async fn append_document_row(&self, row: &DocumentRow) -> Result<(), StoreError> {
        self.store.append_document_row(row).await?;
        tracing::info!(
            filename = %row.filename,
            doc_type = %row.doc_type,
            "Document row written"
        );
        Ok(())
    }
}
