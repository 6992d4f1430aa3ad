use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use super::{DashboardStats, Id, NewMessage, PersonRecord, Store};
use crate::core::models::LinkMention;
use crate::error::{ChatminerError, Result};
use crate::extract::{
    BehaviorAlert, Commitment, CommunicationPattern, ExtractedTask, PersonProfile, SkillCategory,
    TaskStatus,
};
use crate::message::{MessageKind, RawMessage, Timestamp};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS chats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    files TEXT NOT NULL DEFAULT '[]',
    total_messages INTEGER NOT NULL DEFAULT 0,
    imported_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS persons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL DEFAULT 'unknown',
    role_confidence REAL NOT NULL DEFAULT 0.0,
    summary TEXT,
    sentiment TEXT,
    sentiment_score REAL,
    total_messages INTEGER NOT NULL DEFAULT 0,
    is_me INTEGER NOT NULL DEFAULT 0,
    analyzed_at TEXT,
    avatar TEXT
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id INTEGER NOT NULL REFERENCES chats(id),
    person_id INTEGER REFERENCES persons(id),
    content TEXT NOT NULL,
    timestamp TEXT,
    kind TEXT NOT NULL DEFAULT 'text'
);
CREATE INDEX IF NOT EXISTS idx_messages_person ON messages(person_id);

CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    shared_by TEXT NOT NULL DEFAULT '[]',
    contexts TEXT NOT NULL DEFAULT '[]',
    mention_count INTEGER NOT NULL DEFAULT 1,
    first_seen TEXT,
    last_seen TEXT
);

CREATE TABLE IF NOT EXISTS skills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS person_skills (
    person_id INTEGER NOT NULL REFERENCES persons(id),
    skill_id INTEGER NOT NULL REFERENCES skills(id),
    score INTEGER NOT NULL,
    evidence TEXT,
    PRIMARY KEY (person_id, skill_id)
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    priority TEXT NOT NULL DEFAULT 'medium',
    category TEXT NOT NULL DEFAULT 'general',
    assigned_to INTEGER REFERENCES persons(id),
    source_message TEXT,
    due_date TEXT,
    confidence REAL NOT NULL DEFAULT 0.5,
    created_at TEXT NOT NULL,
    completed_at TEXT
);

CREATE TABLE IF NOT EXISTS commitments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id INTEGER NOT NULL REFERENCES persons(id),
    title TEXT NOT NULL,
    commitment_type TEXT NOT NULL,
    due_date TEXT,
    evidence TEXT,
    updated_at TEXT NOT NULL,
    UNIQUE (person_id, title, commitment_type)
);

CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id INTEGER NOT NULL REFERENCES persons(id),
    alert_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    evidence TEXT,
    message_examples TEXT NOT NULL DEFAULT '[]',
    recommendation TEXT,
    confidence REAL NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (person_id, alert_type, title)
);

CREATE TABLE IF NOT EXISTS patterns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    pattern_type TEXT NOT NULL,
    description TEXT,
    persons_involved TEXT NOT NULL DEFAULT '[]',
    examples TEXT NOT NULL DEFAULT '[]',
    recommendations TEXT,
    created_at TEXT NOT NULL
);
";

const PERSON_COLUMNS: &str = "id, name, role, role_confidence, summary, sentiment, \
     sentiment_score, total_messages, is_me, analyzed_at";

/// [`Store`] backed by one SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and ensures the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn person_where(&self, clause: &str, param: &dyn rusqlite::ToSql) -> Result<Option<PersonRecord>> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE {clause}");
        Ok(self
            .conn
            .query_row(&sql, [param], person_from_row)
            .optional()?)
    }

    fn messages_where(&self, clause: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<RawMessage>> {
        let sql = format!(
            "SELECT p.name, m.content, m.timestamp, m.kind
             FROM messages m LEFT JOIN persons p ON p.id = m.person_id
             {clause}
             ORDER BY m.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, message_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn to_json(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string())
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<PersonRecord> {
    Ok(PersonRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        role_confidence: row.get(3)?,
        summary: row.get(4)?,
        sentiment: row.get(5)?,
        sentiment_score: row.get(6)?,
        total_messages: row.get(7)?,
        is_me: row.get::<_, i64>(8)? != 0,
        analyzed_at: row.get(9)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<RawMessage> {
    let timestamp: Option<String> = row.get(2)?;
    let kind: String = row.get(3)?;
    Ok(RawMessage {
        sender: row.get(0)?,
        content: row.get(1)?,
        timestamp: timestamp.as_deref().map(Timestamp::from_iso),
        kind: if kind == "service" {
            MessageKind::Service
        } else {
            MessageKind::Text
        },
    })
}

fn kind_label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Text => "text",
        MessageKind::Service => "service",
    }
}

impl Store for SqliteStore {
    fn upsert_chat(&self, name: &str, files: &[String], messages: usize) -> Result<Id> {
        let id = self.conn.query_row(
            r"
            INSERT INTO chats(name, files, total_messages, imported_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(name) DO UPDATE SET
              files = excluded.files,
              total_messages = total_messages + excluded.total_messages,
              imported_at = excluded.imported_at
            RETURNING id
            ",
            params![name, to_json(files), messages as i64, now()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn get_or_create_person(&self, name: &str) -> Result<Id> {
        self.conn.execute(
            "INSERT INTO persons(name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        let id = self
            .conn
            .query_row("SELECT id FROM persons WHERE name = ?1", params![name], |row| {
                row.get(0)
            })?;
        Ok(id)
    }

    fn find_person(&self, name: &str) -> Result<Option<PersonRecord>> {
        self.person_where("name = ?1", &name)
    }

    fn persons(&self) -> Result<Vec<PersonRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY id"))?;
        let rows = stmt.query_map([], person_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn add_person_messages(&self, person_id: Id, count: usize) -> Result<()> {
        self.conn.execute(
            "UPDATE persons SET total_messages = total_messages + ?2 WHERE id = ?1",
            params![person_id, count as i64],
        )?;
        Ok(())
    }

    fn update_person_profile(&self, person_id: Id, profile: &PersonProfile) -> Result<()> {
        self.conn.execute(
            r"
            UPDATE persons SET
              role = ?2,
              role_confidence = ?3,
              summary = ?4,
              sentiment = ?5,
              sentiment_score = ?6
            WHERE id = ?1
            ",
            params![
                person_id,
                profile.role.as_str(),
                profile.role_confidence,
                profile.summary,
                profile.sentiment.as_str(),
                profile.sentiment_score,
            ],
        )?;
        Ok(())
    }

    fn mark_person_analyzed(&self, person_id: Id) -> Result<()> {
        self.conn.execute(
            "UPDATE persons SET analyzed_at = ?2 WHERE id = ?1",
            params![person_id, now()],
        )?;
        Ok(())
    }

    fn set_me(&self, person_id: Id) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("UPDATE persons SET is_me = 0 WHERE is_me = 1", [])?;
        tx.execute("UPDATE persons SET is_me = 1 WHERE id = ?1", params![person_id])?;
        tx.commit()?;
        Ok(())
    }

    fn get_me(&self) -> Result<Option<PersonRecord>> {
        self.person_where("is_me = ?1", &1_i64)
    }

    fn insert_messages(&self, chat_id: Id, batch: &[NewMessage<'_>]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO messages(chat_id, person_id, content, timestamp, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for msg in batch {
                stmt.execute(params![
                    chat_id,
                    msg.person_id,
                    msg.content,
                    msg.timestamp.map(ToString::to_string),
                    kind_label(msg.kind),
                ])?;
            }
        }
        tx.commit()?;
        debug!(chat_id, count = batch.len(), "messages committed");
        Ok(batch.len())
    }

    fn upsert_link(&self, link: &LinkMention) -> Result<Id> {
        let existing: Option<(Id, String)> = self
            .conn
            .query_row(
                "SELECT id, shared_by FROM links WHERE url = ?1",
                params![link.url],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let first = link.first_shared.as_ref().map(ToString::to_string);
        let last = link.last_shared.as_ref().map(ToString::to_string);

        match existing {
            None => {
                let contexts = serde_json::to_string(&link.contexts)?;
                self.conn.execute(
                    r"
                    INSERT INTO links(url, shared_by, contexts, mention_count, first_seen, last_seen)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ",
                    params![
                        link.url,
                        to_json(&link.shared_by),
                        contexts,
                        link.mention_count as i64,
                        first,
                        last,
                    ],
                )?;
                Ok(self.conn.last_insert_rowid())
            }
            Some((id, shared_by)) => {
                let mut senders: Vec<String> = serde_json::from_str(&shared_by).unwrap_or_default();
                for name in &link.shared_by {
                    if !senders.contains(name) {
                        senders.push(name.clone());
                    }
                }
                self.conn.execute(
                    r"
                    UPDATE links SET
                      mention_count = mention_count + ?2,
                      shared_by = ?3,
                      first_seen = COALESCE(first_seen, ?4),
                      last_seen = COALESCE(?5, last_seen)
                    WHERE id = ?1
                    ",
                    params![id, link.mention_count as i64, to_json(&senders), first, last],
                )?;
                Ok(id)
            }
        }
    }

    fn get_or_create_skill(&self, name: &str, category: SkillCategory) -> Result<Id> {
        self.conn.execute(
            "INSERT INTO skills(name, category) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
            params![name, category.as_str()],
        )?;
        let id = self
            .conn
            .query_row("SELECT id FROM skills WHERE name = ?1", params![name], |row| {
                row.get(0)
            })?;
        Ok(id)
    }

    fn upsert_person_skill(
        &self,
        person_id: Id,
        skill_id: Id,
        score: u8,
        evidence: &str,
    ) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO person_skills(person_id, skill_id, score, evidence)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(person_id, skill_id) DO UPDATE SET
              score = excluded.score,
              evidence = excluded.evidence
            ",
            params![person_id, skill_id, score, evidence],
        )?;
        Ok(())
    }

    fn insert_task(&self, task: &ExtractedTask) -> Result<Id> {
        let assignee = match task.assigned_to.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(self.get_or_create_person(name)?),
            _ => None,
        };
        self.conn.execute(
            r"
            INSERT INTO tasks(title, description, status, priority, category, assigned_to,
                              source_message, due_date, confidence, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
            params![
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.category.as_str(),
                assignee,
                task.source_message,
                task.due_date,
                task.confidence,
                now(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_task_status(&self, task_id: Id, status: TaskStatus) -> Result<()> {
        let completed_at = (status == TaskStatus::Completed).then(now);
        let updated = self.conn.execute(
            "UPDATE tasks SET status = ?2, completed_at = ?3 WHERE id = ?1",
            params![task_id, status.as_str(), completed_at],
        )?;
        if updated == 0 {
            return Err(ChatminerError::unknown_task(task_id));
        }
        Ok(())
    }

    fn upsert_commitment(&self, person_id: Id, commitment: &Commitment) -> Result<Id> {
        let id = self.conn.query_row(
            r"
            INSERT INTO commitments(person_id, title, commitment_type, due_date, evidence, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(person_id, title, commitment_type) DO UPDATE SET
              due_date = excluded.due_date,
              evidence = excluded.evidence,
              updated_at = excluded.updated_at
            RETURNING id
            ",
            params![
                person_id,
                commitment.title,
                commitment.commitment_type.as_str(),
                commitment.due_date,
                commitment.evidence,
                now(),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn upsert_alert(&self, person_id: Id, alert: &BehaviorAlert) -> Result<Id> {
        let id = self.conn.query_row(
            r"
            INSERT INTO alerts(person_id, alert_type, severity, title, description, evidence,
                               message_examples, recommendation, confidence, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(person_id, alert_type, title) DO UPDATE SET
              severity = excluded.severity,
              description = excluded.description,
              evidence = excluded.evidence,
              message_examples = excluded.message_examples,
              recommendation = excluded.recommendation,
              confidence = excluded.confidence,
              updated_at = excluded.updated_at
            RETURNING id
            ",
            params![
                person_id,
                alert.alert_type.as_str(),
                alert.severity.as_str(),
                alert.title,
                alert.description,
                alert.evidence,
                to_json(&alert.message_examples),
                alert.recommendation,
                alert.confidence,
                now(),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn insert_pattern(&self, pattern: &CommunicationPattern) -> Result<Id> {
        self.conn.execute(
            r"
            INSERT INTO patterns(name, pattern_type, description, persons_involved, examples,
                                 recommendations, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                pattern.name,
                pattern.pattern_type.as_str(),
                pattern.description,
                to_json(&pattern.persons_involved),
                to_json(&pattern.examples),
                pattern.recommendations,
                now(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn person_messages(&self, person_id: Id) -> Result<Vec<RawMessage>> {
        self.messages_where("WHERE m.person_id = ?1 AND m.kind = 'text'", &[&person_id])
    }

    fn all_messages(&self) -> Result<Vec<RawMessage>> {
        self.messages_where("", &[])
    }

    fn dashboard_stats(&self) -> Result<DashboardStats> {
        let mut stats = self.conn.query_row(
            r"
            SELECT
              (SELECT COUNT(*) FROM persons WHERE total_messages > 0),
              (SELECT COUNT(*) FROM messages),
              (SELECT COUNT(*) FROM tasks),
              (SELECT COUNT(*) FROM patterns),
              (SELECT COUNT(*) FROM links),
              (SELECT COUNT(*) FROM commitments),
              (SELECT COUNT(*) FROM alerts)
            ",
            [],
            |row| {
                Ok(DashboardStats {
                    persons: row.get(0)?,
                    messages: row.get(1)?,
                    tasks: row.get(2)?,
                    tasks_by_status: BTreeMap::new(),
                    patterns: row.get(3)?,
                    links: row.get(4)?,
                    commitments: row.get(5)?,
                    alerts: row.get(6)?,
                })
            },
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, count) = row?;
            stats.tasks_by_status.insert(status, count);
        }
        Ok(stats)
    }
}
