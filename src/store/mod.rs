//! Persistence port.
//!
//! The orchestrators never talk to a database directly: they go through
//! [`Store`], which exposes get-or-create and upsert operations keyed by the
//! natural identities of the domain (person name, link URL, skill name).
//! [`SqliteStore`] is the only implementation; each worker thread opens its
//! own instance.

mod sqlite;

pub use sqlite::SqliteStore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::models::LinkMention;
use crate::error::Result;
use crate::extract::{
    BehaviorAlert, Commitment, CommunicationPattern, ExtractedTask, PersonProfile, SkillCategory,
    TaskStatus,
};
use crate::message::{MessageKind, RawMessage, Timestamp};

/// Row id.
pub type Id = i64;

/// A person as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: Id,
    pub name: String,
    pub role: String,
    pub role_confidence: f64,
    pub summary: Option<String>,
    pub sentiment: Option<String>,
    pub sentiment_score: Option<f64>,
    pub total_messages: i64,
    pub is_me: bool,
    pub analyzed_at: Option<String>,
}

impl PersonRecord {
    /// Returns `true` once the single-person analysis ran for this person.
    pub fn is_analyzed(&self) -> bool {
        self.analyzed_at.is_some()
    }
}

/// One message ready to be written.
#[derive(Debug, Clone, Copy)]
pub struct NewMessage<'a> {
    pub person_id: Option<Id>,
    pub content: &'a str,
    pub timestamp: Option<&'a Timestamp>,
    pub kind: MessageKind,
}

impl<'a> NewMessage<'a> {
    /// Borrows `msg`, attributing it to `person_id`.
    pub fn of(msg: &'a RawMessage, person_id: Option<Id>) -> Self {
        Self {
            person_id,
            content: &msg.content,
            timestamp: msg.timestamp.as_ref(),
            kind: msg.kind,
        }
    }
}

/// Aggregate counts for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Persons with at least one message
    pub persons: i64,
    pub messages: i64,
    pub tasks: i64,
    pub tasks_by_status: BTreeMap<String, i64>,
    pub patterns: i64,
    pub links: i64,
    pub commitments: i64,
    pub alerts: i64,
}

impl DashboardStats {
    /// Tasks with the given status.
    pub fn tasks_with(&self, status: TaskStatus) -> i64 {
        self.tasks_by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// Create, look up and upsert operations the pipeline needs.
///
/// Implementations must make person, link and skill writes idempotent on
/// their natural keys. Commitments and alerts are upserted on
/// `(person, title, type)` so re-running an analysis refreshes them in place.
pub trait Store: Send {
    /// Records an imported chat by name, adding `messages` to its total.
    fn upsert_chat(&self, name: &str, files: &[String], messages: usize) -> Result<Id>;

    /// Looks up a person by name, inserting them if absent.
    fn get_or_create_person(&self, name: &str) -> Result<Id>;

    fn find_person(&self, name: &str) -> Result<Option<PersonRecord>>;

    /// All persons in insertion order.
    fn persons(&self) -> Result<Vec<PersonRecord>>;

    /// Adds `count` to the person's message total.
    fn add_person_messages(&self, person_id: Id, count: usize) -> Result<()>;

    /// Writes role, confidence, summary and sentiment from `profile`.
    fn update_person_profile(&self, person_id: Id, profile: &PersonProfile) -> Result<()>;

    /// Stamps the person as analyzed now.
    fn mark_person_analyzed(&self, person_id: Id) -> Result<()>;

    /// Flags `person_id` as the main user, clearing any previous one.
    fn set_me(&self, person_id: Id) -> Result<()>;

    fn get_me(&self) -> Result<Option<PersonRecord>>;

    /// Appends a batch of messages in one transaction.
    fn insert_messages(&self, chat_id: Id, batch: &[NewMessage<'_>]) -> Result<usize>;

    /// Inserts a link, or bumps its count and refreshes `last_seen`.
    fn upsert_link(&self, link: &LinkMention) -> Result<Id>;

    fn get_or_create_skill(&self, name: &str, category: SkillCategory) -> Result<Id>;

    /// Sets the (person, skill) score and evidence.
    fn upsert_person_skill(&self, person_id: Id, skill_id: Id, score: u8, evidence: &str)
    -> Result<()>;

    /// Inserts a task, resolving `assigned_to` to a person.
    fn insert_task(&self, task: &ExtractedTask) -> Result<Id>;

    fn update_task_status(&self, task_id: Id, status: TaskStatus) -> Result<()>;

    fn upsert_commitment(&self, person_id: Id, commitment: &Commitment) -> Result<Id>;

    fn upsert_alert(&self, person_id: Id, alert: &BehaviorAlert) -> Result<Id>;

    fn insert_pattern(&self, pattern: &CommunicationPattern) -> Result<Id>;

    /// Text messages written by the person, oldest first.
    fn person_messages(&self, person_id: Id) -> Result<Vec<RawMessage>>;

    /// Every stored message, oldest first.
    fn all_messages(&self) -> Result<Vec<RawMessage>>;

    fn dashboard_stats(&self) -> Result<DashboardStats>;
}
