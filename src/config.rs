//! Configuration types.
//!
//! Everything is read from the environment once, in `main`, and handed to the
//! library as typed structs. Nothing inside the pipeline reads process state.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default number of recent messages considered per run.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Upper bound accepted by the mailbox listing API.
pub const MAX_WINDOW_SIZE: usize = 500;

pub const DEFAULT_MAILBOX_SCOPE: &str = "INBOX";
pub const DEFAULT_SUMMARIZER_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_SHEETS_DOCUMENTS_TAB: &str = "Documents";

/// Default cap on email body characters sent to the model.
pub const DEFAULT_MAX_BODY_CHARS: usize = 8000;

/// Orchestrator configuration, passed in at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Store identifier: database path for libSQL, spreadsheet id for Sheets.
    pub store_id: String,
    /// Base URL of the generative-summarization service.
    pub summarizer_endpoint: String,
    /// Mailbox label/folder the window is drawn from.
    pub mailbox_scope: String,
    /// Number of most recent messages considered per run.
    pub window_size: usize,
}

impl IngestConfig {
    pub fn new(store_id: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            summarizer_endpoint: DEFAULT_SUMMARIZER_ENDPOINT.to_string(),
            mailbox_scope: DEFAULT_MAILBOX_SCOPE.to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_mailbox_scope(mut self, scope: impl Into<String>) -> Self {
        self.mailbox_scope = scope.into();
        self
    }

    pub fn with_summarizer_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.summarizer_endpoint = endpoint.into();
        self
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "store_id".into(),
                message: "must not be empty".into(),
            });
        }
        if self.window_size == 0 || self.window_size > MAX_WINDOW_SIZE {
            return Err(ConfigError::InvalidValue {
                key: "window_size".into(),
                message: format!("must be between 1 and {MAX_WINDOW_SIZE}"),
            });
        }
        if self.mailbox_scope.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "mailbox_scope".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Mailbox provider configuration.
#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub api_base: String,
    pub access_token: SecretString,
}

/// Summarizer (generative model) configuration.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub access_token: Option<SecretString>,
    pub max_body_chars: usize,
}

/// Which tabular store backs the ledger and the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    LibSql,
    Sheets,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "libsql" | "sqlite" => Ok(Self::LibSql),
            "sheets" => Ok(Self::Sheets),
            other => Err(ConfigError::InvalidValue {
                key: "INBOX_DIGEST_STORE_BACKEND".into(),
                message: format!("unknown backend '{other}' (expected libsql or sheets)"),
            }),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub sheets_api_base: String,
    pub sheets_access_token: Option<SecretString>,
    /// Sheet that receives document rows.
    pub sheets_documents_tab: String,
}

/// Everything `main` needs to wire the service together.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ingest: IngestConfig,
    pub mailbox: MailboxConfig,
    pub summarizer: SummarizerConfig,
    pub store: StoreConfig,
    pub port: u16,
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            non_empty(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let store_id = required("INBOX_DIGEST_STORE_ID")?;
        let window_size = match non_empty("INBOX_DIGEST_WINDOW_SIZE") {
            Some(raw) => parse_number("INBOX_DIGEST_WINDOW_SIZE", &raw)?,
            None => DEFAULT_WINDOW_SIZE,
        };
        let endpoint = non_empty("INBOX_DIGEST_SUMMARIZER_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_SUMMARIZER_ENDPOINT.to_string());

        let ingest = IngestConfig::new(store_id)
            .with_window_size(window_size)
            .with_mailbox_scope(
                non_empty("INBOX_DIGEST_MAILBOX_SCOPE")
                    .unwrap_or_else(|| DEFAULT_MAILBOX_SCOPE.to_string()),
            )
            .with_summarizer_endpoint(endpoint.clone());
        ingest.validate()?;

        let mailbox = MailboxConfig {
            api_base: non_empty("GMAIL_API_BASE")
                .unwrap_or_else(|| DEFAULT_GMAIL_API_BASE.to_string()),
            access_token: SecretString::from(required("GMAIL_ACCESS_TOKEN")?),
        };

        let max_body_chars = match non_empty("INBOX_DIGEST_MAX_BODY_CHARS") {
            Some(raw) => parse_number("INBOX_DIGEST_MAX_BODY_CHARS", &raw)?,
            None => DEFAULT_MAX_BODY_CHARS,
        };
        let summarizer = SummarizerConfig {
            endpoint,
            model: non_empty("INBOX_DIGEST_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: non_empty("GEMINI_API_KEY").map(SecretString::from),
            access_token: non_empty("GOOGLE_ACCESS_TOKEN").map(SecretString::from),
            max_body_chars,
        };
        if summarizer.api_key.is_none() && summarizer.access_token.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "GEMINI_API_KEY or GOOGLE_ACCESS_TOKEN".into(),
            ));
        }

        let backend = match non_empty("INBOX_DIGEST_STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::LibSql,
        };
        let store = StoreConfig {
            backend,
            sheets_api_base: non_empty("SHEETS_API_BASE")
                .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string()),
            sheets_access_token: non_empty("SHEETS_ACCESS_TOKEN").map(SecretString::from),
            sheets_documents_tab: non_empty("SHEETS_DOCUMENTS_TAB")
                .map(|tab| tab.trim().to_string())
                .unwrap_or_else(|| DEFAULT_SHEETS_DOCUMENTS_TAB.to_string()),
        };
        if backend == StoreBackend::Sheets && store.sheets_access_token.is_none() {
            return Err(ConfigError::MissingEnvVar("SHEETS_ACCESS_TOKEN".into()));
        }

        let port = match non_empty("INBOX_DIGEST_PORT") {
            Some(raw) => parse_number("INBOX_DIGEST_PORT", &raw)?,
            None => 8080,
        };

        Ok(Self {
            ingest,
            mailbox,
            summarizer,
            store,
            port,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}' is not a valid number"),
    })
}
