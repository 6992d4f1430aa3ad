//! Unified error types for chatminer.
//!
//! This module provides a single [`ChatminerError`] enum that covers every
//! failure the ingestion and analysis pipelines can surface. The taxonomy
//! mirrors how failures are treated:
//!
//! - **Input errors** ([`NotFound`](ChatminerError::NotFound)) are raised
//!   immediately, before any worker starts.
//! - **Parse anomalies** (bad dates, empty messages, odd participant names)
//!   are normalized or dropped by the parser and never show up here.
//! - **Extraction errors** ([`Llm`](ChatminerError::Llm),
//!   [`Http`](ChatminerError::Http), [`Json`](ChatminerError::Json)) are
//!   recovered inside the extraction protocol and only logged.
//! - **Persistence errors** ([`Database`](ChatminerError::Database)) propagate
//!   and end the running worker with a single error event.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for chatminer operations.
///
/// # Example
///
/// ```rust
/// use chatminer::error::Result;
/// use chatminer::RawMessage;
///
/// fn my_function() -> Result<Vec<RawMessage>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatminerError>;

/// The error type for all chatminer operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatminerError {
    /// An I/O error occurred while reading an export or writing the database.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An input export does not exist.
    ///
    /// Raised before any background work starts so the caller can report it
    /// directly.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// The missing path
        path: PathBuf,
    },

    /// Failed to parse an input document.
    #[error("Failed to parse {format}{}: {source}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    Parse {
        /// The format being parsed (e.g., "Telegram HTML", "config TOML")
        format: &'static str,
        /// The underlying parse error
        #[source]
        source: ParseErrorKind,
        /// The file path, if available
        path: Option<PathBuf>,
    },

    /// Invalid date in a message filter.
    ///
    /// Date filters expect YYYY-MM-DD format.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// JSON parsing/serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The model provider rejected or failed a completion call.
    #[error("{provider} call failed: {message}")]
    Llm {
        /// Provider name ("gemini", "openai")
        provider: &'static str,
        /// What went wrong
        message: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Persistence error from the SQLite store.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what's wrong
        message: String,
    },

    /// No API key is configured for the selected provider.
    #[error("No API key configured for {provider} (set it in the config file or {env_var})")]
    MissingApiKey {
        /// Provider name
        provider: &'static str,
        /// Environment variable consulted as a fallback
        env_var: &'static str,
    },

    /// A participant name is not known to the store.
    #[error("Unknown person '{name}'")]
    UnknownPerson {
        /// The name that was looked up
        name: String,
    },

    /// No stored task has this id.
    #[error("Unknown task {id}")]
    UnknownTask {
        /// The id that was looked up
        id: i64,
    },

    /// A background worker stopped without reporting a terminal event.
    #[error("Worker error: {message}")]
    Worker {
        /// Description of what happened
        message: String,
    },
}

/// Kinds of parse errors that can occur.
#[derive(Debug, Error)]
pub enum ParseErrorKind {
    /// TOML parsing error
    #[error("{0}")]
    Toml(#[from] toml::de::Error),
}

impl From<toml::de::Error> for ChatminerError {
    fn from(err: toml::de::Error) -> Self {
        ChatminerError::Parse {
            format: "config TOML",
            source: ParseErrorKind::Toml(err),
            path: None,
        }
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatminerError {
    /// Creates a not-found error for an input path.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ChatminerError::NotFound { path: path.into() }
    }

    /// Creates a config parse error that remembers which file failed.
    pub fn config_parse(source: toml::de::Error, path: impl Into<PathBuf>) -> Self {
        ChatminerError::Parse {
            format: "config TOML",
            source: ParseErrorKind::Toml(source),
            path: Some(path.into()),
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        ChatminerError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Creates a provider call error.
    pub fn llm(provider: &'static str, message: impl Into<String>) -> Self {
        ChatminerError::Llm {
            provider,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        ChatminerError::Config {
            message: message.into(),
        }
    }

    /// Creates a missing API key error.
    pub fn missing_api_key(provider: &'static str, env_var: &'static str) -> Self {
        ChatminerError::MissingApiKey { provider, env_var }
    }

    /// Creates an unknown person error.
    pub fn unknown_person(name: impl Into<String>) -> Self {
        ChatminerError::UnknownPerson { name: name.into() }
    }

    /// Creates an unknown task error.
    pub fn unknown_task(id: i64) -> Self {
        ChatminerError::UnknownTask { id }
    }

    /// Creates a worker error.
    pub fn worker(message: impl Into<String>) -> Self {
        ChatminerError::Worker {
            message: message.into(),
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatminerError::Io(_))
    }

    /// Returns `true` if an input path was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChatminerError::NotFound { .. })
    }

    /// Returns `true` if this is a parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, ChatminerError::Parse { .. })
    }

    /// Returns `true` if this is an invalid date error.
    pub fn is_invalid_date(&self) -> bool {
        matches!(self, ChatminerError::InvalidDate { .. })
    }

    /// Returns `true` if this error came from the model boundary
    /// (provider failure, transport, or undecodable response).
    pub fn is_extraction(&self) -> bool {
        matches!(
            self,
            ChatminerError::Llm { .. } | ChatminerError::Http(_) | ChatminerError::Json(_)
        )
    }

    /// Returns `true` if this is a persistence error.
    pub fn is_database(&self) -> bool {
        matches!(self, ChatminerError::Database(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = ChatminerError::from(io_err);
        let display = err.to_string();
        assert!(display.contains("IO error"));
        assert!(display.contains("access denied"));
    }

    #[test]
    fn test_not_found_display() {
        let err = ChatminerError::not_found("/exports/messages.html");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("/exports/messages.html"));
    }

    #[test]
    fn test_parse_error_with_path() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err = ChatminerError::config_parse(toml_err, "/etc/chatminer.toml");
        let display = err.to_string();
        assert!(err.is_parse());
        assert!(display.contains("config TOML"));
        assert!(display.contains("/etc/chatminer.toml"));
    }

    #[test]
    fn test_parse_error_without_path() {
        let toml_err = toml::from_str::<toml::Value>("[x").unwrap_err();
        let err = ChatminerError::from(toml_err);
        let display = err.to_string();
        assert!(display.contains("config TOML"));
        assert!(!display.contains("file:"));
    }

    #[test]
    fn test_invalid_date_display() {
        let err = ChatminerError::invalid_date("01-13-2024");
        assert!(err.is_invalid_date());
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_llm_error_is_extraction() {
        let err = ChatminerError::llm("gemini", "returned 503");
        assert!(err.is_extraction());
        assert!(err.to_string().contains("gemini"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_json_error_is_extraction() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ChatminerError = json_err.into();
        assert!(err.is_extraction());
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_missing_api_key_mentions_env_var() {
        let err = ChatminerError::missing_api_key("openai", "OPENAI_API_KEY");
        let display = err.to_string();
        assert!(display.contains("openai"));
        assert!(display.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_database_error() {
        let err: ChatminerError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(err.is_database());
        assert!(!err.is_extraction());
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let err = ChatminerError::from(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_is_methods() {
        let err = ChatminerError::unknown_person("Zoe");
        assert!(!err.is_io());
        assert!(!err.is_parse());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("Zoe"));
        assert_eq!(ChatminerError::unknown_task(7).to_string(), "Unknown task 7");
    }
}
