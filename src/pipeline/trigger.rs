//! Mailbox change notifications.
//!
//! Push deliveries arrive as a Pub/Sub envelope whose `message.data` is the
//! base64 of `{"emailAddress": ..., "historyId": ...}`. The bare JSON is also
//! accepted. Anything unusable yields a trigger without a cursor.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use serde::Deserialize;
use serde_json::Value;

/// A change notification. A run only proceeds when `cursor()` is `Some`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trigger {
    pub history_id: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushEnvelope {
    message: PushMessage,
}

#[derive(Debug, Deserialize)]
struct PushMessage {
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Notification {
    email_address: Option<String>,
    history_id: Option<Value>,
}

impl Trigger {
    pub fn new(history_id: impl Into<String>) -> Self {
        Self {
            history_id: Some(history_id.into()),
            email_address: None,
        }
    }

    /// A trigger that never starts a run.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The history cursor, if present and non-blank.
    pub fn cursor(&self) -> Option<&str> {
        self.history_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Parse a push body (envelope or bare notification).
    pub fn from_push_body(body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            tracing::warn!("Push body is not JSON; ignoring");
            return Self::empty();
        };

        if value.get("message").is_some() {
            let data = serde_json::from_value::<PushEnvelope>(value)
                .ok()
                .and_then(|env| env.message.data);
            let Some(data) = data else {
                tracing::warn!("Push envelope has no data; ignoring");
                return Self::empty();
            };
            return match decode_data(&data) {
                Some(bytes) => Self::from_notification(&bytes),
                None => {
                    tracing::warn!("Push data is not valid base64; ignoring");
                    Self::empty()
                }
            };
        }

        Self::from_value(value)
    }

    fn from_notification(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                tracing::warn!("Push data is not a JSON notification: {e}");
                Self::empty()
            }
        }
    }

    fn from_value(value: Value) -> Self {
        let notification: Notification = serde_json::from_value(value).unwrap_or_default();
        let history_id = match notification.history_id {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self {
            history_id,
            email_address: notification.email_address,
        }
    }
}

fn decode_data(data: &str) -> Option<Vec<u8>> {
    let data = data.trim();
    STANDARD
        .decode(data)
        .or_else(|_| URL_SAFE.decode(data))
        .ok()
}
