//! Message fetcher: lists the recent window and hydrates single messages.

use std::sync::Arc;

use tracing::debug;

use crate::error::MailboxError;
use crate::mailbox::Mailbox;
use crate::mailbox::encoding::decode_base64url;
use crate::mailbox::types::{Header, Message, MessageRef, RawMessage, RawPart};

pub const NO_SUBJECT: &str = "(no subject)";
pub const UNKNOWN_HEADER: &str = "unknown";

/// Lists the most recent messages of one scope and hydrates them.
pub struct MessageFetcher {
    mailbox: Arc<dyn Mailbox>,
    scope: String,
}

impl MessageFetcher {
    pub fn new(mailbox: Arc<dyn Mailbox>, scope: impl Into<String>) -> Self {
        Self {
            mailbox,
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The provider's `n` most recent messages in scope, in listing order.
    pub async fn list_recent(&self, n: usize) -> Result<Vec<MessageRef>, MailboxError> {
        self.mailbox.list_recent(&self.scope, n).await
    }

    /// Fetch the full message and expand it into header fields, body and parts.
    pub async fn hydrate(&self, msg_ref: &MessageRef) -> Result<Message, MailboxError> {
        let raw = self.mailbox.get_full(&msg_ref.id).await?;
        let mut message = message_from_raw(raw);
        if message.id.is_empty() {
            message.id = msg_ref.id.clone();
        }
        debug!(
            message_id = %message.id,
            parts = message.attachment_parts.len(),
            "Hydrated message"
        );
        Ok(message)
    }
}

/// Expand a raw message resource into a `Message`.
pub fn message_from_raw(raw: RawMessage) -> Message {
    let payload = raw.payload.unwrap_or_default();
    let headers = &payload.headers;

    let subject = header_value(headers, "Subject")
        .unwrap_or(NO_SUBJECT)
        .to_string();
    let sender = header_value(headers, "From")
        .unwrap_or(UNKNOWN_HEADER)
        .to_string();
    let date = header_value(headers, "Date")
        .unwrap_or(UNKNOWN_HEADER)
        .to_string();

    let body = extract_body(&payload)
        .or_else(|| raw.snippet.clone())
        .unwrap_or_default();

    let mut attachment_parts = Vec::new();
    flatten_parts(&payload.parts, &mut attachment_parts);

    Message {
        id: raw.id,
        subject,
        sender,
        date,
        body,
        attachment_parts,
    }
}

/// Case-insensitive header lookup. Blank values count as missing.
pub fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
        .filter(|v| !v.trim().is_empty())
}

/// Pre-order flattening of the part tree. Containers are kept too, so a
/// named part is reported at its position in the source message.
fn flatten_parts(parts: &[RawPart], out: &mut Vec<RawPart>) {
    for part in parts {
        out.push(RawPart {
            part_id: part.part_id.clone(),
            mime_type: part.mime_type.clone(),
            filename: part.filename.clone(),
            headers: part.headers.clone(),
            body: part.body.clone(),
            parts: Vec::new(),
        });
        flatten_parts(&part.parts, out);
    }
}

/// Readable body text: first unnamed `text/plain` part, else the first
/// unnamed `text/html` part with tags stripped.
fn extract_body(payload: &RawPart) -> Option<String> {
    if let Some(text) = find_inline_text(payload, "text/plain") {
        return Some(text);
    }
    find_inline_text(payload, "text/html").map(|html| strip_html(&html))
}

fn find_inline_text(part: &RawPart, mime: &str) -> Option<String> {
    if part.named().is_none()
        && part.mime().eq_ignore_ascii_case(mime)
        && let Some(data) = part.body.data.as_deref()
        && let Ok(bytes) = decode_base64url(data)
    {
        return Some(String::from_utf8_lossy(&bytes).into_owned());
    }
    part.parts.iter().find_map(|p| find_inline_text(p, mime))
}

/// Strip HTML tags from content (basic).
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}
