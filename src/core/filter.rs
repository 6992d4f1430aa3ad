//! Selecting the messages an extraction runs over.
//!
//! [`MessageFilter`] narrows a message stream by sender and by date window
//! before it is sampled. Service entries and empty messages never pass.
//!
//! # Examples
//!
//! ```
//! use chatminer::core::filter::MessageFilter;
//! use chatminer::{RawMessage, Timestamp};
//!
//! # fn main() -> chatminer::Result<()> {
//! let messages = vec![
//!     RawMessage::new("Alice", "Old").with_timestamp(Timestamp::parse("01.01.2024 12:00")),
//!     RawMessage::new("Alice", "New").with_timestamp(Timestamp::parse("15.06.2024 12:00")),
//!     RawMessage::new("Bob", "Hi").with_timestamp(Timestamp::parse("16.06.2024 12:00")),
//! ];
//!
//! let filter = MessageFilter::new()
//!     .with_sender("Alice")
//!     .with_date_from("2024-06-01")?;
//!
//! let kept = filter.apply(&messages);
//! assert_eq!(kept.len(), 1);
//! assert_eq!(kept[0].content, "New");
//! # Ok(())
//! # }
//! ```
//!
//! # Behavior Notes
//!
//! - Sender matching is exact: names are the identity key
//! - Messages without a parsed timestamp are **excluded** when a date window is active
//! - Multiple filters are combined with AND logic

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ChatminerError, Result};
use crate::message::{MessageKind, RawMessage};

/// Filter criteria for message slices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    /// Include only messages on or after this moment.
    pub after: Option<NaiveDateTime>,

    /// Include only messages on or before this moment.
    pub before: Option<NaiveDateTime>,

    /// Include only messages from this sender.
    pub sender: Option<String>,
}

impl MessageFilter {
    /// Creates a filter that keeps every non-empty text message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the start date (inclusive). Format: `YYYY-MM-DD`.
    pub fn with_date_from(mut self, date: &str) -> Result<Self> {
        self.after = Some(parse_day(date)?.and_time(chrono::NaiveTime::MIN));
        Ok(self)
    }

    /// Sets the end date (inclusive, through 23:59:59). Format: `YYYY-MM-DD`.
    pub fn with_date_to(mut self, date: &str) -> Result<Self> {
        let day = parse_day(date)?;
        self.before = day.and_hms_opt(23, 59, 59);
        Ok(self)
    }

    /// Restricts the filter to one sender.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Returns `true` if a date window is set.
    pub fn has_date_filter(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }

    /// Returns `true` if `msg` passes every active criterion.
    pub fn matches(&self, msg: &RawMessage) -> bool {
        if msg.kind == MessageKind::Service || msg.is_empty() {
            return false;
        }

        if let Some(sender) = &self.sender {
            if !msg.is_from(sender) {
                return false;
            }
        }

        if self.has_date_filter() {
            let Some(ts) = msg.timestamp.as_ref().and_then(|t| t.as_datetime()) else {
                return false;
            };
            if self.after.is_some_and(|after| ts < after) {
                return false;
            }
            if self.before.is_some_and(|before| ts > before) {
                return false;
            }
        }

        true
    }

    /// Returns the messages that pass, in order.
    pub fn apply(&self, messages: &[RawMessage]) -> Vec<RawMessage> {
        messages.iter().filter(|m| self.matches(m)).cloned().collect()
    }
}

fn parse_day(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| ChatminerError::invalid_date(date))
}
