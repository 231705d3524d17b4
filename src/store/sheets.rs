//! Google Sheets backend for the row store.
//!
//! The spreadsheet carries an "Emails" sheet and a documents sheet
//! ("Documents" unless configured otherwise), each with a header row. Sheets has no uniqueness constraint, so exactly-once
//! relies on the fresh ledger read at the start of each run.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::config::DEFAULT_SHEETS_DOCUMENTS_TAB;
use crate::error::StoreError;
use crate::store::RowStore;
use crate::store::rows::{DocumentRow, EmailRow};

/// Message-id column of the Emails sheet, header row excluded.
pub const EMAIL_ID_RANGE: &str = "Emails!H2:H";
pub const EMAILS_APPEND_RANGE: &str = "Emails!A1";

pub struct SheetsStore {
    client: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    access_token: SecretString,
    documents_range: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ValueRange {
    values: Vec<Vec<serde_json::Value>>,
}

impl SheetsStore {
    pub fn new(api_base: &str, spreadsheet_id: &str, access_token: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            access_token,
            documents_range: append_range(DEFAULT_SHEETS_DOCUMENTS_TAB),
        }
    }

    /// Append document rows to `tab` instead of the default sheet.
    pub fn with_documents_tab(mut self, tab: &str) -> Self {
        self.documents_range = append_range(tab);
        self
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{range}",
            self.api_base, self.spreadsheet_id
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let resp = request
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn append(&self, range: &str, cells: &[&str]) -> Result<(), StoreError> {
        let request = self
            .client
            .post(format!("{}:append", self.values_url(range)))
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [cells] }));
        self.send(request).await?;
        Ok(())
    }
}

fn append_range(tab: &str) -> String {
    format!("{tab}!A1")
}

/// First cell of each returned row, as text.
fn first_column(range: ValueRange) -> Vec<String> {
    range
        .values
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .map(|cell| match cell {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .collect()
}

#[async_trait]
impl RowStore for SheetsStore {
    fn backend_name(&self) -> &'static str {
        "sheets"
    }

    async fn read_message_ids(&self) -> Result<Vec<String>, StoreError> {
        let resp = self
            .send(self.client.get(self.values_url(EMAIL_ID_RANGE)))
            .await?;
        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(first_column(range))
    }

    async fn append_email_row(&self, row: &EmailRow) -> Result<(), StoreError> {
        self.append(EMAILS_APPEND_RANGE, &row.cells()).await
    }

    async fn append_document_row(&self, row: &DocumentRow) -> Result<(), StoreError> {
        self.append(&self.documents_range, &row.cells()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Json;
    use axum::Router;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use serde_json::Value;

    use super::*;
    use crate::store::deep_link;

    #[derive(Default)]
    struct Sheet {
        appended: Mutex<Vec<(String, String, Value)>>,
    }

    async fn read_ids(Path((_id, range)): Path<(String, String)>) -> (StatusCode, Json<Value>) {
        assert_eq!(range, EMAIL_ID_RANGE);
        (
            StatusCode::OK,
            Json(json!({
                "range": "Emails!H2:H4",
                "majorDimension": "ROWS",
                "values": [["m1"], [], ["m2"]]
            })),
        )
    }

    async fn append(
        State(sheet): State<Arc<Sheet>>,
        Path((_id, range)): Path<(String, String)>,
        Query(query): Query<std::collections::HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let option = query.get("valueInputOption").cloned().unwrap_or_default();
        sheet.appended.lock().unwrap().push((range, option, body));
        StatusCode::OK
    }

    async fn spawn_sheet() -> (String, Arc<Sheet>) {
        let sheet = Arc::new(Sheet::default());
        let app = Router::new()
            .route("/spreadsheets/{id}/values/{range}", get(read_ids).post(append))
            .with_state(sheet.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), sheet)
    }

    #[tokio::test]
    async fn reads_id_column_skipping_empty_rows() {
        let (base, _sheet) = spawn_sheet().await;
        let store = SheetsStore::new(&base, "sheet-1", SecretString::from("t"));
        assert_eq!(store.read_message_ids().await.unwrap(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn appends_rows_raw_in_column_order() {
        let (base, sheet) = spawn_sheet().await;
        let store = SheetsStore::new(&base, "sheet-1", SecretString::from("t"));

        let row = DocumentRow {
            filename: "invoice.pdf".into(),
            subject: "Invoice".into(),
            doc_type: "invoice".into(),
            summary: "March".into(),
            total: "".into(),
            date: "2025-03-01".into(),
            deep_link_url: deep_link("m1"),
        };
        store.append_document_row(&row).await.unwrap();

        let appended = sheet.appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        let (range, option, body) = &appended[0];
        assert_eq!(range, "Documents!A1:append");
        assert_eq!(option, "RAW");
        assert_eq!(body["values"][0][0], "invoice.pdf");
        assert_eq!(body["values"][0][4], "");
        assert_eq!(body["values"][0].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn document_rows_follow_configured_tab() {
        let (base, sheet) = spawn_sheet().await;
        let store = SheetsStore::new(&base, "sheet-1", SecretString::from("t"))
            .with_documents_tab("Attachments");

        let row = DocumentRow {
            filename: "scan.png".into(),
            subject: "Receipt".into(),
            doc_type: "receipt".into(),
            summary: "Coffee".into(),
            total: "$4.50".into(),
            date: "".into(),
            deep_link_url: deep_link("m2"),
        };
        store.append_document_row(&row).await.unwrap();

        assert_eq!(sheet.appended.lock().unwrap()[0].0, "Attachments!A1:append");
    }

    #[tokio::test]
    async fn unreachable_store_is_http_error() {
        let store = SheetsStore::new("http://127.0.0.1:1", "x", SecretString::from("t"));
        assert!(matches!(
            store.read_message_ids().await,
            Err(StoreError::Http(_))
        ));
    }
}
