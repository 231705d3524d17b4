//! libSQL backend for the row store.
//!
//! Supports local file and in-memory databases. The Emails table carries a
//! UNIQUE message id, so a racing duplicate append fails with
//! `StoreError::Duplicate` instead of writing a second row.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::rows::{DocumentRow, EmailRow};
use crate::store::RowStore;

const MEMORY: &str = ":memory:";

/// libSQL row store.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::with_database(db).await?;
        info!(path = %path.display(), "Row store opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests and dry runs).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(MEMORY)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;
        Self::with_database(db).await
    }

    /// Interpret a store id as a database path; `:memory:` opens an ephemeral store.
    pub async fn from_store_id(store_id: &str) -> Result<Self, StoreError> {
        if store_id.trim() == MEMORY {
            Self::new_memory().await
        } else {
            Self::new_local(Path::new(store_id.trim())).await
        }
    }

    async fn with_database(db: LibSqlDatabase) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// All email rows in append order.
    pub async fn read_email_rows(&self) -> Result<Vec<EmailRow>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT date, sender, subject, summary, tag, action_required, deep_link_url, message_id
                 FROM emails ORDER BY row_id",
                (),
            )
            .await
            .map_err(|e| StoreError::Query(format!("read_email_rows: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("read_email_rows: {e}")))?
        {
            out.push(
                row_to_email(&row).map_err(|e| StoreError::Query(format!("row parse: {e}")))?,
            );
        }
        Ok(out)
    }

    /// All document rows in append order.
    pub async fn read_document_rows(&self) -> Result<Vec<DocumentRow>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT filename, subject, doc_type, summary, total, date, deep_link_url
                 FROM documents ORDER BY row_id",
                (),
            )
            .await
            .map_err(|e| StoreError::Query(format!("read_document_rows: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("read_document_rows: {e}")))?
        {
            out.push(
                row_to_document(&row).map_err(|e| StoreError::Query(format!("row parse: {e}")))?,
            );
        }
        Ok(out)
    }
}

fn row_to_email(row: &libsql::Row) -> Result<EmailRow, libsql::Error> {
    Ok(EmailRow {
        date: row.get::<String>(0)?,
        sender: row.get::<String>(1)?,
        subject: row.get::<String>(2)?,
        summary: row.get::<String>(3)?,
        tag: row.get::<String>(4)?,
        action_required: row.get::<String>(5)?,
        deep_link_url: row.get::<String>(6)?,
        message_id: row.get::<String>(7)?,
    })
}

fn row_to_document(row: &libsql::Row) -> Result<DocumentRow, libsql::Error> {
    Ok(DocumentRow {
        filename: row.get::<String>(0)?,
        subject: row.get::<String>(1)?,
        doc_type: row.get::<String>(2)?,
        summary: row.get::<String>(3)?,
        total: row.get::<String>(4)?,
        date: row.get::<String>(5)?,
        deep_link_url: row.get::<String>(6)?,
    })
}

#[async_trait]
impl RowStore for LibSqlStore {
    fn backend_name(&self) -> &'static str {
        "libsql"
    }

    async fn read_message_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut rows = self
            .conn()
            .query("SELECT message_id FROM emails ORDER BY row_id", ())
            .await
            .map_err(|e| StoreError::Query(format!("read_message_ids: {e}")))?;

        let mut ids = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("read_message_ids: {e}")))?
        {
            ids.push(
                row.get::<String>(0)
                    .map_err(|e| StoreError::Query(format!("row parse: {e}")))?,
            );
        }
        Ok(ids)
    }

    async fn append_email_row(&self, row: &EmailRow) -> Result<(), StoreError> {
        self.conn()
            .execute(
                "INSERT INTO emails (date, sender, subject, summary, tag, action_required,
                    deep_link_url, message_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.date.as_str(),
                    row.sender.as_str(),
                    row.subject.as_str(),
                    row.summary.as_str(),
                    row.tag.as_str(),
                    row.action_required.as_str(),
                    row.deep_link_url.as_str(),
                    row.message_id.as_str(),
                ],
            )
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint failed") {
                    StoreError::Duplicate {
                        message_id: row.message_id.clone(),
                    }
                } else {
                    StoreError::Query(format!("append_email_row: {e}"))
                }
            })?;

        debug!(message_id = %row.message_id, "Email row appended");
        Ok(())
    }

    async fn append_document_row(&self, row: &DocumentRow) -> Result<(), StoreError> {
        self.conn()
            .execute(
                "INSERT INTO documents (filename, subject, doc_type, summary, total, date,
                    deep_link_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.filename.as_str(),
                    row.subject.as_str(),
                    row.doc_type.as_str(),
                    row.summary.as_str(),
                    row.total.as_str(),
                    row.date.as_str(),
                    row.deep_link_url.as_str(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("append_document_row: {e}")))?;

        debug!(filename = %row.filename, "Document row appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::deep_link;

    fn email(id: &str) -> EmailRow {
        EmailRow {
            date: "Mon, 3 Mar 2025 10:00:00 +0000".into(),
            sender: "alice@example.test".into(),
            subject: format!("Subject {id}"),
            summary: "summary".into(),
            tag: "Work".into(),
            action_required: "no".into(),
            deep_link_url: deep_link(id),
            message_id: id.into(),
        }
    }

    fn document(filename: &str) -> DocumentRow {
        DocumentRow {
            filename: filename.into(),
            subject: "Subject".into(),
            doc_type: "invoice".into(),
            summary: "An invoice".into(),
            total: "$10".into(),
            date: String::new(),
            deep_link_url: deep_link("m1"),
        }
    }

    #[tokio::test]
    async fn empty_store_has_no_ids() {
        let store = LibSqlStore::new_memory().await.unwrap();
        assert!(store.read_message_ids().await.unwrap().is_empty());
        assert_eq!(store.backend_name(), "libsql");
    }

    #[tokio::test]
    async fn emails_read_back_in_append_order() {
        let store = LibSqlStore::new_memory().await.unwrap();
        for id in ["c", "a", "b"] {
            store.append_email_row(&email(id)).await.unwrap();
        }
        assert_eq!(store.read_message_ids().await.unwrap(), vec!["c", "a", "b"]);

        let rows = store.read_email_rows().await.unwrap();
        assert_eq!(rows[1], email("a"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = LibSqlStore::new_memory().await.unwrap();
        store.append_email_row(&email("m1")).await.unwrap();
        let err = store.append_email_row(&email("m1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { ref message_id } if message_id == "m1"));
        assert_eq!(store.read_email_rows().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn documents_read_back_in_append_order() {
        let store = LibSqlStore::new_memory().await.unwrap();
        store.append_document_row(&document("one.pdf")).await.unwrap();
        store.append_document_row(&document("two.png")).await.unwrap();

        let rows = store.read_document_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], document("one.pdf"));
        assert_eq!(rows[1].filename, "two.png");
        assert_eq!(rows[1].date, "");
    }

    #[tokio::test]
    async fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("digest.db");

        {
            let store = LibSqlStore::new_local(&path).await.unwrap();
            store.append_email_row(&email("persisted")).await.unwrap();
        }

        let store = LibSqlStore::from_store_id(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(store.read_message_ids().await.unwrap(), vec!["persisted"]);
    }
}
