//! Orchestration of imports and analyses.
//!
//! - [`ingest`] - Parse, merge and persist export files
//! - [`analysis`] - Bulk, single-person and behavior-alert flows
//! - [`worker`] - Background threads with progress and terminal events
//!
//! Each orchestrator can run in-thread with a progress callback or on a
//! [`Worker`] that owns its own store connection.

pub mod analysis;
pub mod ingest;
pub mod worker;

pub use analysis::{
    AnalysisEvent, AnalysisJob, AnalysisOutcome, Analyzer, PersonAlerts, PersonAnalysis,
    spawn_analysis,
};
pub use ingest::{IngestEvent, IngestSummary, Ingestor, spawn_ingestion};
pub use worker::{Worker, WorkerEvent};
