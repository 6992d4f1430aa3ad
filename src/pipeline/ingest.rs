//! Import of export files into the store.
//!
//! Files are parsed and merged in sorted path order, then written in this
//! order: the chat record, every participant (get-or-create plus count
//! increment), the messages in checkpoints, and every link. Each checkpoint
//! is committed on its own; a failure part-way leaves earlier writes in place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use tracing::info;

use super::worker::{Worker, WorkerEvent};
use crate::core::merge::{ChatMerger, MergeStats, merge_order};
use crate::core::models::ParsedChat;
use crate::error::{ChatminerError, Result};
use crate::parsers::{ChatParser, ExportFormat, create_parser};
use crate::store::{Id, NewMessage, SqliteStore, Store};

/// Counts of what one import processed.
pub type IngestSummary = MergeStats;

/// Events emitted by an ingestion worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    Progress(String),
    Finished(IngestSummary),
    Error(String),
}

impl WorkerEvent for IngestEvent {
    type Output = IngestSummary;

    fn finished(output: IngestSummary) -> Self {
        IngestEvent::Finished(output)
    }

    fn failed(message: String) -> Self {
        IngestEvent::Error(message)
    }

    fn into_outcome(self) -> std::result::Result<std::result::Result<IngestSummary, String>, Self> {
        match self {
            IngestEvent::Finished(summary) => Ok(Ok(summary)),
            IngestEvent::Error(message) => Ok(Err(message)),
            progress @ IngestEvent::Progress(_) => Err(progress),
        }
    }
}

/// Drives one import against a store.
pub struct Ingestor<'a> {
    store: &'a dyn Store,
    parser: &'a dyn ChatParser,
    checkpoint_every: usize,
}

impl<'a> Ingestor<'a> {
    /// Creates an ingestor writing messages `checkpoint_every` at a time.
    pub fn new(store: &'a dyn Store, parser: &'a dyn ChatParser, checkpoint_every: usize) -> Self {
        Self {
            store,
            parser,
            checkpoint_every: checkpoint_every.max(1),
        }
    }

    /// Parses, merges and persists `paths`.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P], progress: &dyn Fn(String)) -> Result<IngestSummary> {
        let ordered = merge_order(paths);
        let mut merger = ChatMerger::new();
        for (i, path) in ordered.iter().enumerate() {
            progress(format!(
                "Parsing file {}/{}: {}",
                i + 1,
                ordered.len(),
                path.display()
            ));
            merger.push(self.parser.parse(path)?);
        }
        let files = merger.files();
        let mut chat = merger.finish();
        if chat.chat_name.is_empty() {
            chat.chat_name = fallback_chat_name(&ordered);
        }
        let summary = MergeStats::of(&chat, files);

        progress(format!("Saving chat '{}'", chat.chat_name));
        let file_names: Vec<String> = ordered.iter().map(|p| p.display().to_string()).collect();
        let chat_id = self
            .store
            .upsert_chat(&chat.chat_name, &file_names, chat.messages.len())?;

        progress(format!("Saving {} participants", chat.participants.len()));
        let person_ids = self.save_participants(&chat)?;

        self.save_messages(chat_id, &chat, &person_ids, progress)?;

        progress(format!("Saving {} links", chat.links.len()));
        for link in &chat.links {
            self.store.upsert_link(link)?;
        }

        info!(
            chat = %chat.chat_name,
            files = summary.files,
            messages = summary.messages,
            participants = summary.participants,
            links = summary.links,
            "import complete"
        );
        Ok(summary)
    }

    fn save_participants(&self, chat: &ParsedChat) -> Result<HashMap<String, Id>> {
        let mut ids = HashMap::with_capacity(chat.participants.len());
        for participant in &chat.participants {
            let id = self.store.get_or_create_person(&participant.name)?;
            self.store
                .add_person_messages(id, participant.message_count)?;
            ids.insert(participant.name.clone(), id);
        }
        Ok(ids)
    }

    fn save_messages(
        &self,
        chat_id: Id,
        chat: &ParsedChat,
        person_ids: &HashMap<String, Id>,
        progress: &dyn Fn(String),
    ) -> Result<()> {
        let total = chat.messages.len();
        let mut saved = 0;
        for chunk in chat.messages.chunks(self.checkpoint_every) {
            let batch: Vec<NewMessage<'_>> = chunk
                .iter()
                .map(|msg| NewMessage::of(msg, msg.sender().and_then(|s| person_ids.get(s).copied())))
                .collect();
            saved += self.store.insert_messages(chat_id, &batch)?;
            progress(format!("Saved {saved}/{total} messages"));
        }
        Ok(())
    }
}

fn fallback_chat_name(paths: &[PathBuf]) -> String {
    paths
        .first()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Imported chat".to_string())
}

/// Starts an import of `paths` on a background thread.
///
/// Missing files are reported here, before any thread starts. The worker
/// opens its own connection to `db_path`.
pub fn spawn_ingestion(
    db_path: PathBuf,
    format: ExportFormat,
    paths: Vec<PathBuf>,
    checkpoint_every: usize,
) -> Result<Worker<IngestEvent>> {
    if let Some(missing) = paths.iter().find(|p| !p.exists()) {
        return Err(ChatminerError::not_found(missing));
    }

    Worker::spawn("ingest", move |tx: &Sender<IngestEvent>| {
        let store = SqliteStore::open(&db_path)?;
        let parser = create_parser(format);
        let report = |message: String| {
            let _ = tx.send(IngestEvent::Progress(message));
        };
        Ingestor::new(&store, parser.as_ref(), checkpoint_every).run(&paths, &report)
    })
}
