//! Core transcript processing.
//!
//! This module contains:
//! - [`models`] - Parsed chat, participants and link mentions
//! - [`merge`] - Combining several exports into one chat
//! - [`sampler`] - Bounding message slices before extraction
//! - [`filter`] - Selecting messages by sender and date
//!
//! # Quick Start
//!
//! ```rust
//! use chatminer::core::{MessageFilter, merge_chats, sample_messages};
//! ```

pub mod filter;
pub mod merge;
pub mod models;
pub mod sampler;

pub use filter::MessageFilter;
pub use merge::{ChatMerger, MergeStats, merge_chats, parse_files};
pub use models::{DateRange, LinkContext, LinkMention, ParsedChat, Participant, ParticipantTable};
pub use sampler::{sample_indices, sample_messages};
