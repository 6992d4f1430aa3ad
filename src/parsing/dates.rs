//! Export date normalization.
//!
//! Chat exports render dates in several locale-dependent layouts, usually
//! with a trailing UTC offset in the `title` attribute:
//!
//! - `15.01.2024 10:30:45 UTC+03:00` (day-first with dots)
//! - `2024-01-15 10:30:45` (ISO-like)
//! - `15/01/2024 10:30` (day-first with slashes)
//! - `15 January 2024` (service entries: date separators)
//!
//! Candidates are tried in a fixed order; the first match wins. Inputs no
//! layout matches are returned unchanged as [`Timestamp::Raw`].

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::message::Timestamp;

/// Date-time layouts, in match order.
pub const DATETIME_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Date-only layouts used by service entries. They normalize to midnight.
pub const DATE_FORMATS: &[&str] = &["%d %B %Y"];

static UTC_OFFSET_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*UTC(?:\s*[+-]\d{1,2}(?::?\d{2})?)?\s*$").expect("UTC suffix pattern is valid")
});

/// Removes a trailing ` UTC+hh:mm` suffix, if present.
///
/// ```
/// use chatminer::parsing::strip_utc_offset;
///
/// assert_eq!(strip_utc_offset("01/02/2023 10:00 UTC+02:00"), "01/02/2023 10:00");
/// assert_eq!(strip_utc_offset("01/02/2023 10:00"), "01/02/2023 10:00");
/// ```
pub fn strip_utc_offset(input: &str) -> &str {
    match UTC_OFFSET_SUFFIX.find(input) {
        Some(m) => &input[..m.start()],
        None => input,
    }
}

/// Parses an export date against every known layout.
pub fn parse_export_datetime(input: &str) -> Option<NaiveDateTime> {
    let candidate = strip_utc_offset(input.trim()).trim();
    if candidate.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(candidate, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Normalizes an export date, keeping the original text when nothing matches.
pub fn normalize_timestamp(input: &str) -> Timestamp {
    match parse_export_datetime(input) {
        Some(dt) => Timestamp::Parsed(dt),
        None => Timestamp::Raw(input.trim().to_string()),
    }
}
