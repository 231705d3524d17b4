//! Request shaping and response parsing for the two summarization calls.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::mailbox::{AttachmentPart, Message};
use crate::summarizer::records::{DocumentSummaryRecord, EmailSummaryRecord, UNKNOWN};

// ── Instructions ────────────────────────────────────────────────────

/// Instruction appended after the email content.
pub const EMAIL_INSTRUCTION: &str = "Summarize this email and respond with JSON fields:\n\
     - subject: the email subject\n\
     - sender: who sent it\n\
     - summary: one line\n\
     - tag: one main mailbox tag (e.g. Finance, Travel, Work, Personal, Promotions)\n\
     - action_required: \"yes\" or \"no\", and if yes what must be done\n\
     - next_action: the concrete next step, if any\n\
     - suggested_reply: a one-line reply, if a reply makes sense";

/// Instruction appended after an attachment's binary content.
pub fn attachment_instruction(filename: &str) -> String {
    format!(
        "Analyze the attached file '{filename}' and write a summarized description of one line \
         (two only if needed). Make a macro classification of the type of document \
         (e.g. invoice, receipt, contract, report, image). Include the total amount ($) and the \
         date if available. Respond with JSON fields: type, summary, total, date."
    )
}

// ── Schemas ─────────────────────────────────────────────────────────

pub fn email_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "subject": { "type": "STRING" },
            "sender": { "type": "STRING" },
            "summary": { "type": "STRING", "description": "One-line summary" },
            "tag": { "type": "STRING", "description": "One main mailbox tag" },
            "action_required": { "type": "STRING", "description": "yes/no and what" },
            "next_action": { "type": "STRING", "nullable": true },
            "suggested_reply": { "type": "STRING", "nullable": true }
        },
        "required": ["subject", "sender", "summary", "tag", "action_required"]
    })
}

pub fn document_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type": { "type": "STRING", "description": "Macro document classification" },
            "summary": { "type": "STRING" },
            "total": { "type": "STRING", "nullable": true },
            "date": { "type": "STRING", "nullable": true }
        },
        "required": ["type", "summary"]
    })
}

// ── Content ─────────────────────────────────────────────────────────

/// Render an email for the model. The body is cut at `max_body_chars`.
pub fn build_email_content(message: &Message, max_body_chars: usize) -> String {
    let mut content = String::with_capacity(512);
    content.push_str(&format!("Subject: {}\n", message.subject));
    content.push_str(&format!("From: {}\n", message.sender));
    content.push_str(&format!("Date: {}\n", message.date));

    let attachments: Vec<&str> = message
        .attachment_parts
        .iter()
        .filter_map(|p| p.named())
        .collect();
    if !attachments.is_empty() {
        content.push_str(&format!("Attachments: {}\n", attachments.join(", ")));
    }

    let body: String = message.body.chars().take(max_body_chars).collect();
    content.push_str("\nBody:\n");
    content.push_str(&body);
    if message.body.chars().count() > max_body_chars {
        content.push_str("\n[truncated]");
    }
    content
}

/// Mime type to declare for an attachment's inline data.
pub fn attachment_mime(attachment: &AttachmentPart) -> &str {
    if attachment.mime_type.trim().is_empty() {
        "application/octet-stream"
    } else {
        &attachment.mime_type
    }
}

// ── Response parsing ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EmailSummaryResponse {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    sender: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    tag: String,
    #[serde(default, alias = "actionRequired")]
    action_required: Option<Value>,
    #[serde(default, alias = "nextAction")]
    next_action: Option<String>,
    #[serde(default, alias = "suggestedReply")]
    suggested_reply: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentSummaryResponse {
    #[serde(default, rename = "type")]
    doc_type: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    total: Option<Value>,
    #[serde(default)]
    date: Option<String>,
}

/// Parse the email summary. Missing subject/sender fall back to the headers.
pub fn parse_email_response(raw: &str, message: &Message) -> Result<EmailSummaryRecord, String> {
    let json_str = extract_json_object(raw);
    let response: EmailSummaryResponse =
        serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))?;

    let summary = response.summary.trim().to_string();
    if summary.is_empty() {
        return Err("response has no summary".into());
    }

    Ok(EmailSummaryRecord {
        subject: non_blank(Some(response.subject)).unwrap_or_else(|| message.subject.clone()),
        sender: non_blank(Some(response.sender)).unwrap_or_else(|| message.sender.clone()),
        summary,
        tag: response.tag.trim().to_string(),
        action_required: value_to_text(response.action_required)
            .unwrap_or_else(|| UNKNOWN.to_string()),
        next_action: non_blank(response.next_action),
        suggested_reply: non_blank(response.suggested_reply),
    })
}

/// Parse the attachment analysis.
pub fn parse_document_response(raw: &str) -> Result<DocumentSummaryRecord, String> {
    let json_str = extract_json_object(raw);
    let response: DocumentSummaryResponse =
        serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))?;

    let summary = response.summary.trim().to_string();
    if summary.is_empty() {
        return Err("response has no summary".into());
    }

    Ok(DocumentSummaryRecord {
        doc_type: non_blank(Some(response.doc_type)).unwrap_or_else(|| UNKNOWN.to_string()),
        summary,
        total: value_to_text(response.total),
        date: non_blank(response.date),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Models sometimes answer strings with numbers or booleans.
fn value_to_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_blank(Some(s)),
        Value::Bool(true) => Some("yes".into()),
        Value::Bool(false) => Some("no".into()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Pull the JSON object out of model output that may be fenced or padded
/// with prose.
pub fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    let unfenced = strip_code_fence(trimmed).unwrap_or(trimmed);
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if end > start => unfenced[start..=end].to_string(),
        _ => unfenced.to_string(),
    }
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let after = &text[text.find("```")? + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    let end = after.find("```")?;
    Some(after[..end].trim())
}
