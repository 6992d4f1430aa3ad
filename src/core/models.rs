//! Core data models for parsed transcripts.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::message::{RawMessage, Timestamp};

/// Names longer than this are treated as mis-parsed and pruned.
pub const MAX_PARTICIPANT_NAME_CHARS: usize = 50;

/// One sender seen in a transcript. The name is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Display name
    pub name: String,
    /// Messages attributed to this name
    pub message_count: usize,
    /// Earliest parsed timestamp among those messages
    pub first_seen: Option<NaiveDateTime>,
    /// Latest parsed timestamp among those messages
    pub last_seen: Option<NaiveDateTime>,
}

impl Participant {
    /// Creates a participant with no messages yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message_count: 0,
            first_seen: None,
            last_seen: None,
        }
    }

    /// Widens `first_seen`/`last_seen` to include `dt`.
    pub fn observe(&mut self, dt: NaiveDateTime) {
        self.first_seen = Some(self.first_seen.map_or(dt, |cur| cur.min(dt)));
        self.last_seen = Some(self.last_seen.map_or(dt, |cur| cur.max(dt)));
    }

    /// Returns `true` if the name looks like a parsing artifact rather than a person.
    ///
    /// Zero messages, a comma (two names glued together), or an overlong name.
    pub fn is_anomalous(&self) -> bool {
        self.message_count == 0
            || self.name.contains(',')
            || self.name.chars().count() > MAX_PARTICIPANT_NAME_CHARS
    }
}

/// Participants keyed by name, iterated in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Participant>", into = "Vec<Participant>")]
pub struct ParticipantTable {
    entries: Vec<Participant>,
    index: HashMap<String, usize>,
}

impl ParticipantTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one message for `name`, creating the participant on first sight.
    pub fn record(&mut self, name: &str, timestamp: Option<&Timestamp>) {
        let participant = self.get_or_insert(name);
        participant.message_count += 1;
        if let Some(dt) = timestamp.and_then(Timestamp::as_datetime) {
            participant.observe(dt);
        }
    }

    /// Returns the participant named `name`, inserting an empty one if absent.
    pub fn get_or_insert(&mut self, name: &str) -> &mut Participant {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(Participant::new(name));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    /// Folds another participant record into this table.
    ///
    /// Counts are summed and the seen-range widened when the name already exists.
    pub fn absorb(&mut self, other: Participant) {
        if let Some(&idx) = self.index.get(&other.name) {
            let existing = &mut self.entries[idx];
            existing.message_count += other.message_count;
            if let Some(dt) = other.first_seen {
                existing.observe(dt);
            }
            if let Some(dt) = other.last_seen {
                existing.observe(dt);
            }
        } else {
            self.index.insert(other.name.clone(), self.entries.len());
            self.entries.push(other);
        }
    }

    /// Drops every participant for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Participant) -> bool) {
        self.entries.retain(|p| keep(p));
        self.reindex();
    }

    /// Removes anomalous participants (see [`Participant::is_anomalous`]).
    pub fn prune(&mut self) {
        self.retain(|p| !p.is_anomalous());
    }

    /// Looks up a participant by name.
    pub fn get(&self, name: &str) -> Option<&Participant> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    /// Returns `true` if `name` is a known participant.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates participants in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Participant> {
        self.entries.iter()
    }

    /// Participant names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|p| p.name.as_str()).collect()
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
    }
}

impl From<Vec<Participant>> for ParticipantTable {
    fn from(participants: Vec<Participant>) -> Self {
        let mut table = Self::new();
        for p in participants {
            table.absorb(p);
        }
        table
    }
}

impl From<ParticipantTable> for Vec<Participant> {
    fn from(table: ParticipantTable) -> Self {
        table.entries
    }
}

impl<'a> IntoIterator for &'a ParticipantTable {
    type Item = &'a Participant;
    type IntoIter = std::slice::Iter<'a, Participant>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// One message a link was seen in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkContext {
    /// Leading part of the message text
    pub message_snippet: String,
    /// Who posted it
    pub sender: Option<String>,
    /// When it was posted
    pub timestamp: Option<Timestamp>,
}

/// Aggregated mentions of a single URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkMention {
    /// The URL, trailing punctuation removed
    pub url: String,
    /// Distinct senders, first-seen order
    pub shared_by: Vec<String>,
    /// Up to three example messages
    pub contexts: Vec<LinkContext>,
    /// Total mentions, at least 1
    pub mention_count: usize,
    /// First time the URL was posted
    pub first_shared: Option<Timestamp>,
    /// Last time the URL was posted
    pub last_shared: Option<Timestamp>,
}

/// Inclusive span of parsed message timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Computes the span over every parsed timestamp in `messages`.
    pub fn of(messages: &[RawMessage]) -> Option<Self> {
        let mut dates = messages
            .iter()
            .filter_map(|m| m.timestamp.as_ref().and_then(Timestamp::as_datetime));
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), dt| (lo.min(dt), hi.max(dt)));
        Some(Self { start, end })
    }

    /// Smallest range covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// The normalized content of one export, or of several merged exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedChat {
    /// Chat title
    pub chat_name: String,
    /// Messages in source order
    pub messages: Vec<RawMessage>,
    /// Senders keyed by name
    pub participants: ParticipantTable,
    /// Link mentions in first-seen order
    pub links: Vec<LinkMention>,
    /// Span of parsed timestamps, if any
    pub date_range: Option<DateRange>,
}

impl ParsedChat {
    /// Number of messages.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Messages attributed to `name`, in order.
    pub fn messages_from<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawMessage> + 'a {
        self.messages.iter().filter(move |m| m.is_from(name))
    }
}
