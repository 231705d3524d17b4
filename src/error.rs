//! Error types for inbox-digest.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mailbox provider errors.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Mailbox {operation} request failed: {reason}")]
    RequestFailed { operation: String, reason: String },

    #[error("Mailbox {operation} returned HTTP {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Invalid mailbox response for {operation}: {reason}")]
    InvalidResponse { operation: String, reason: String },

    #[error("Mailbox {operation}: not found")]
    NotFound { operation: String },

    #[error("Failed to decode payload: {0}")]
    Decode(String),
}

/// Generative model provider errors.
///
/// These never cross the summarizer boundary; they are logged and turned
/// into degraded records.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} returned no candidates")]
    EmptyResponse { provider: String },
}

/// Tabular store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store misconfigured: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Email row for message {message_id} already exists")]
    Duplicate { message_id: String },

    #[error("Store request failed: {0}")]
    Http(String),

    #[error("Store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid store response: {0}")]
    InvalidResponse(String),
}

/// Pipeline-related errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The dedup ledger could not be read; the run cannot proceed safely.
    #[error("Dedup ledger unavailable: {0}")]
    LedgerUnavailable(StoreError),
}
