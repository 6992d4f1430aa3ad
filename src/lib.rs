//! # Chatminer
//!
//! Turns exported chat transcripts into structured, queryable entities:
//! participants, tasks, skill ratings, commitments, behavior alerts,
//! communication patterns and shared links.
//!
//! ## Overview
//!
//! Two pipelines share one SQLite store:
//!
//! - **Ingestion**: HTML exports are parsed into a [`ParsedChat`](core::models::ParsedChat),
//!   several files are merged into one chat, and participants, messages and
//!   links are persisted with get-or-create semantics.
//! - **Analysis**: stored messages are sampled to a bounded slice, sent to a
//!   language model once per extraction, and the JSON it answers with is
//!   decoded leniently into typed records.
//!
//! ## Quick Start
//!
//! ```rust
//! use chatminer::prelude::*;
//!
//! # fn main() -> chatminer::Result<()> {
//! let html = r#"
//!     <div class="page_header"><div class="text bold">Launch</div></div>
//!     <div class="message"><div class="from_name">Ana</div>
//!         <div class="text">Docs at https://example.com/spec.</div></div>
//!     <div class="message joined"><div class="text">Reviewing tomorrow</div></div>
//! "#;
//!
//! let chat = TelegramHtmlParser::new().parse_str(html)?;
//! assert_eq!(chat.chat_name, "Launch");
//! assert_eq!(chat.participants.get("Ana").unwrap().message_count, 2);
//! assert_eq!(chat.links[0].url, "https://example.com/spec");
//!
//! // Short histories pass through the sampler unchanged
//! assert_eq!(sample_messages(&chat.messages, 300), chat.messages);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`parsers`] - Export parsers ([`ChatParser`](parsers::ChatParser))
//! - [`parsing`] - Shared date, link and HTML helpers
//! - [`core`] - Chat models, merging, sampling and filtering
//! - [`extract`] - Prompts, resilient JSON decoding and typed records
//! - [`llm`] - Model providers behind [`LlmClient`](llm::LlmClient)
//! - [`store`] - Persistence port and its SQLite implementation
//! - [`pipeline`] - Ingestion and analysis orchestrators and workers
//! - [`config`] - TOML configuration
//! - [`progress`] - Step-level progress reporting

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod extract;
pub mod llm;
pub mod message;
pub mod parsers;
pub mod parsing;
pub mod pipeline;
pub mod progress;
pub mod store;

// Re-export the main types at the crate root for convenience
pub use error::{ChatminerError, Result};
pub use message::{MessageKind, RawMessage, Timestamp};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatminer::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ChatminerError, Result};
    pub use crate::message::{MessageKind, RawMessage, Timestamp};

    pub use crate::config::{AppConfig, LlmConfig, SamplingConfig};

    pub use crate::core::filter::MessageFilter;
    pub use crate::core::merge::{ChatMerger, merge_chats, parse_files};
    pub use crate::core::models::{LinkMention, ParsedChat, Participant};
    pub use crate::core::sampler::sample_messages;

    pub use crate::parsers::{ChatParser, ExportFormat, TelegramHtmlParser, create_parser};

    pub use crate::extract::{
        BehaviorAlert, Commitment, CommunicationPattern, ExtractedTask, Extractor, PersonProfile,
    };
    pub use crate::llm::{LlmClient, Provider, create_client};

    pub use crate::store::{SqliteStore, Store};

    pub use crate::pipeline::{
        AnalysisEvent, AnalysisJob, AnalysisOutcome, Analyzer, IngestEvent, IngestSummary,
        Ingestor, spawn_analysis, spawn_ingestion,
    };

    pub use crate::progress::Progress;
}
