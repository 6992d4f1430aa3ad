//! Normalized message type produced by the transcript parser.
//!
//! This module provides [`RawMessage`], one entry of an imported transcript,
//! and [`Timestamp`], which keeps the original text of dates that could not
//! be normalized so nothing is lost for later audit.
//!
//! # Examples
//!
//! ```
//! use chatminer::{RawMessage, Timestamp};
//!
//! let msg = RawMessage::new("Alice", "Hello, world!")
//!     .with_timestamp(Timestamp::parse("15.01.2024 10:30:00"));
//!
//! assert_eq!(msg.sender(), Some("Alice"));
//! assert_eq!(msg.timestamp().unwrap().to_string(), "2024-01-15T10:30:00");
//! ```
//!
//! ## Unparseable dates pass through
//!
//! ```
//! use chatminer::Timestamp;
//!
//! let ts = Timestamp::parse("yesterday-ish");
//! assert!(!ts.is_parsed());
//! assert_eq!(ts.to_string(), "yesterday-ish");
//! ```

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::parsing::dates::normalize_timestamp;

/// ISO-8601 layout used for every normalized timestamp.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A message timestamp as found in an export.
///
/// Dates that match one of the known export layouts become
/// [`Parsed`](Timestamp::Parsed); anything else is kept verbatim as
/// [`Raw`](Timestamp::Raw).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Timestamp {
    /// A normalized local date-time (UTC offset suffixes are dropped).
    Parsed(NaiveDateTime),
    /// The original text of a date no known layout matched.
    Raw(String),
}

impl Timestamp {
    /// Normalizes an export date string, falling back to [`Timestamp::Raw`].
    pub fn parse(input: &str) -> Self {
        normalize_timestamp(input)
    }

    /// Reads back a timestamp previously rendered with [`ToString`].
    pub fn from_iso(input: &str) -> Self {
        NaiveDateTime::parse_from_str(input, ISO_FORMAT)
            .map(Timestamp::Parsed)
            .unwrap_or_else(|_| Timestamp::Raw(input.to_string()))
    }

    /// Returns the normalized date-time, if the input could be parsed.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Timestamp::Parsed(dt) => Some(*dt),
            Timestamp::Raw(_) => None,
        }
    }

    /// Returns `true` if the timestamp was normalized.
    pub fn is_parsed(&self) -> bool {
        matches!(self, Timestamp::Parsed(_))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Parsed(dt) => write!(f, "{}", dt.format(ISO_FORMAT)),
            Timestamp::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Timestamp::Parsed(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Timestamp::from_iso(&raw))
    }
}

/// What kind of entry a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A regular message written by a participant.
    #[default]
    Text,
    /// A service entry (date separators, joins, pins). Never has a sender.
    Service,
}

/// One normalized message from an export.
///
/// Messages with empty content never leave the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Display name of the author, if one could be attributed.
    #[serde(default)]
    pub sender: Option<String>,

    /// Text content of the message.
    pub content: String,

    /// When the message was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub timestamp: Option<Timestamp>,

    /// Message kind.
    #[serde(default)]
    pub kind: MessageKind,
}

impl RawMessage {
    /// Creates a text message attributed to `sender`.
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: Some(sender.into()),
            content: content.into(),
            timestamp: None,
            kind: MessageKind::Text,
        }
    }

    /// Creates a service entry (no sender).
    pub fn service(content: impl Into<String>) -> Self {
        Self {
            sender: None,
            content: content.into(),
            timestamp: None,
            kind: MessageKind::Service,
        }
    }

    /// Builder method to set the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, ts: Timestamp) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Builder method to set or clear the sender.
    #[must_use]
    pub fn with_sender(mut self, sender: Option<String>) -> Self {
        self.sender = sender;
        self
    }

    /// Returns the sender name, if any.
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    /// Returns the message content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the timestamp, if available.
    pub fn timestamp(&self) -> Option<&Timestamp> {
        self.timestamp.as_ref()
    }

    /// Returns `true` if this message's content is empty or whitespace-only.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Returns `true` if this message was written by `name`.
    pub fn is_from(&self, name: &str) -> bool {
        self.sender.as_deref() == Some(name)
    }
}
