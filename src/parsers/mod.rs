//! Chat export parsers.
//!
//! Each parser turns one export file into a [`ParsedChat`] and implements
//! the [`ChatParser`] trait.
//!
//! # Available Parsers
//!
//! - [`TelegramHtmlParser`] - Parses Telegram Desktop HTML exports
//!
//! # Example
//!
//! ```rust
//! use chatminer::parsers::{ExportFormat, create_parser};
//!
//! let parser = create_parser(ExportFormat::TelegramHtml);
//! assert_eq!(parser.name(), "Telegram HTML");
//! ```

mod telegram_html;

pub use telegram_html::TelegramHtmlParser;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::models::ParsedChat;
use crate::error::Result;

/// Trait for parsing one chat export into a [`ParsedChat`].
pub trait ChatParser: Send + Sync {
    /// Returns the name of the parser (e.g., "Telegram HTML").
    fn name(&self) -> &'static str;

    /// Parses an export file.
    ///
    /// # Errors
    ///
    /// Returns [`ChatminerError::NotFound`](crate::ChatminerError::NotFound)
    /// if `path` does not exist, or an IO error if it cannot be read.
    fn parse(&self, path: &Path) -> Result<ParsedChat>;

    /// Parses export content already held in memory.
    fn parse_str(&self, content: &str) -> Result<ParsedChat>;
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ExportFormat {
    /// HTML export written by Telegram Desktop
    #[default]
    #[serde(alias = "telegram", alias = "tg")]
    TelegramHtml,
}

impl ExportFormat {
    /// Returns all format names including aliases.
    pub fn all_names() -> &'static [&'static str] {
        &["telegram-html", "telegram", "tg"]
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::TelegramHtml => write!(f, "Telegram HTML"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "telegram-html" | "telegram" | "tg" => Ok(ExportFormat::TelegramHtml),
            _ => Err(format!(
                "Unknown export format: '{}'. Expected one of: {}",
                s,
                ExportFormat::all_names().join(", ")
            )),
        }
    }
}

/// Creates a parser for the given export format.
pub fn create_parser(format: ExportFormat) -> Box<dyn ChatParser> {
    match format {
        ExportFormat::TelegramHtml => Box::new(TelegramHtmlParser::new()),
    }
}
