//! Inbox Digest: summarizes new mail and its attachments into a
//! tabular store, exactly once per message.

pub mod config;
pub mod error;
pub mod llm;
pub mod mailbox;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod summarizer;
