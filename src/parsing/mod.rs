//! Shared parsing utilities.
//!
//! This module contains the pieces of transcript parsing that don't depend on
//! a particular export layout: date normalization, URL mention extraction, and
//! the HTML element helpers used by the export parser.

pub mod dates;
pub mod html;
pub mod links;

// Re-export commonly used items
pub use dates::{normalize_timestamp, parse_export_datetime, strip_utc_offset};
pub use links::{LinkTable, find_urls, trim_url};
