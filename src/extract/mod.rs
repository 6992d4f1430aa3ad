//! Structured extraction from message slices.
//!
//! An extraction is one round trip: build the prompt for the selected
//! [`ExtractionTask`], call the model exactly once, locate and decode the
//! JSON it returned, and map it onto typed records. Failures never escape:
//! a provider error or empty answer is treated as `{}`, an undecodable answer
//! is logged and yields the task's empty default.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chatminer::extract::Extractor;
//! use chatminer::llm::LlmClient;
//! use chatminer::RawMessage;
//!
//! struct Canned;
//!
//! impl LlmClient for Canned {
//!     fn name(&self) -> &'static str { "canned" }
//!     fn complete(&self, _prompt: &str) -> chatminer::Result<String> {
//!         Ok("```json\n{\"tasks\": [{\"title\": \"Send invoice\", \"priority\": \"high\"}]}\n```".into())
//!     }
//! }
//!
//! let extractor = Extractor::new(Arc::new(Canned));
//! let tasks = extractor.extract_tasks(&[RawMessage::new("Ana", "Luis, send the invoice")]);
//! assert_eq!(tasks[0].title, "Send invoice");
//! ```

pub mod decode;
pub mod prompt;
pub mod records;

pub use decode::{extract_json_payload, parse_response};
pub use records::{
    ALERT_CONFIDENCE_THRESHOLD, AlertType, BehaviorAlert, Commitment, CommitmentType,
    CommunicationPattern, ExtractedTask, PatternType, PersonProfile, PersonRole, Priority,
    Sentiment, Severity, Skill, SkillCategory, TaskCategory, TaskStatus,
};

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::LlmClient;
use crate::message::RawMessage;

/// The kinds of extraction the protocol supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionTask {
    ExtractTasks,
    ProfilePerson,
    DetectPatterns,
    DetectBehaviorAlerts,
    ProfileWithCommitments,
}

impl ExtractionTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionTask::ExtractTasks => "extract-tasks",
            ExtractionTask::ProfilePerson => "profile-person",
            ExtractionTask::DetectPatterns => "detect-patterns",
            ExtractionTask::DetectBehaviorAlerts => "detect-behavior-alerts",
            ExtractionTask::ProfileWithCommitments => "profile-with-commitments",
        }
    }
}

impl fmt::Display for ExtractionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs extractions against one model client.
#[derive(Clone)]
pub struct Extractor {
    client: Arc<dyn LlmClient>,
}

impl Extractor {
    /// Creates an extractor over `client`.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Name of the underlying provider.
    pub fn provider(&self) -> &'static str {
        self.client.name()
    }

    /// Calls the model once and decodes its answer into a JSON value.
    ///
    /// Returns [`Value::Null`] when the answer cannot be decoded; every
    /// `decode_*` function maps that to its empty default.
    pub fn run(&self, task: ExtractionTask, prompt: &str) -> Value {
        debug!(task = %task, provider = self.client.name(), chars = prompt.len(), "extraction call");

        let response = match self.client.complete(prompt) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!(task = %task, "model returned no text");
                "{}".to_string()
            }
            Err(e) => {
                warn!(task = %task, error = %e, "model call failed");
                "{}".to_string()
            }
        };

        match parse_response(&response) {
            Ok(value) => value,
            Err(e) => {
                warn!(task = %task, error = %e, "could not decode model response");
                Value::Null
            }
        }
    }

    /// Extracts action items from a chat-wide sample.
    pub fn extract_tasks(&self, messages: &[RawMessage]) -> Vec<ExtractedTask> {
        let value = self.run(ExtractionTask::ExtractTasks, &prompt::tasks_prompt(messages));
        decode::decode_tasks(&value)
    }

    /// Profiles `name` from their own messages.
    pub fn profile_person(&self, name: &str, messages: &[RawMessage], is_me: bool) -> PersonProfile {
        let value = self.run(
            ExtractionTask::ProfilePerson,
            &prompt::profile_prompt(name, messages, is_me),
        );
        decode::decode_profile(&value)
    }

    /// Profiles `name` and lists their commitments.
    pub fn profile_with_commitments(
        &self,
        name: &str,
        messages: &[RawMessage],
        is_me: bool,
    ) -> PersonProfile {
        let value = self.run(
            ExtractionTask::ProfileWithCommitments,
            &prompt::profile_with_commitments_prompt(name, messages, is_me),
        );
        decode::decode_profile(&value)
    }

    /// Finds recurring dynamics in a chat-wide sample.
    pub fn detect_patterns(
        &self,
        messages: &[RawMessage],
        participants: &[&str],
    ) -> Vec<CommunicationPattern> {
        let value = self.run(
            ExtractionTask::DetectPatterns,
            &prompt::patterns_prompt(messages, participants),
        );
        decode::decode_patterns(&value)
    }

    /// Flags concerning behavior of `name`. Only alerts with confidence of
    /// at least [`ALERT_CONFIDENCE_THRESHOLD`] are returned.
    pub fn detect_behavior_alerts(&self, name: &str, messages: &[RawMessage]) -> Vec<BehaviorAlert> {
        let value = self.run(
            ExtractionTask::DetectBehaviorAlerts,
            &prompt::behavior_alerts_prompt(name, messages),
        );
        decode::decode_alerts(&value)
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("provider", &self.client.name())
            .finish()
    }
}
