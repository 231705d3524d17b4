//! Gmail REST client implementing the `Mailbox` read surface.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::config::MailboxConfig;
use crate::error::MailboxError;
use crate::mailbox::Mailbox;
use crate::mailbox::types::{AttachmentBody, ListMessagesResponse, MessageRef, RawMessage};

/// Gmail API client bound to the authenticated user (`users/me`).
pub struct GmailClient {
    client: reqwest::Client,
    api_base: String,
    access_token: SecretString,
}

impl GmailClient {
    pub fn new(config: &MailboxConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/users/me/{path}", self.api_base)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, MailboxError> {
        let resp = request
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| MailboxError::RequestFailed {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MailboxError::NotFound {
                operation: operation.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailboxError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| MailboxError::InvalidResponse {
                operation: operation.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn list_recent(
        &self,
        scope: &str,
        limit: usize,
    ) -> Result<Vec<MessageRef>, MailboxError> {
        let request = self
            .client
            .get(self.url("messages"))
            .query(&[("maxResults", limit.to_string()), ("labelIds", scope.to_string())]);
        let list: ListMessagesResponse = self.get_json("messages.list", request).await?;
        tracing::debug!(scope, count = list.messages.len(), "Listed recent messages");
        Ok(list.messages)
    }

    async fn get_full(&self, id: &str) -> Result<RawMessage, MailboxError> {
        let request = self
            .client
            .get(self.url(&format!("messages/{id}")))
            .query(&[("format", "full")]);
        self.get_json(&format!("messages.get({id})"), request).await
    }

    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<String, MailboxError> {
        let request = self.client.get(self.url(&format!(
            "messages/{message_id}/attachments/{attachment_id}"
        )));
        let body: AttachmentBody = self
            .get_json(&format!("attachments.get({message_id})"), request)
            .await?;
        Ok(body.data)
    }
}
