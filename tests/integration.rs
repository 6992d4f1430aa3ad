//! Integration tests: exports on disk through parsing, storage and analysis.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chatminer::extract::PersonRole;
use chatminer::prelude::*;
use tempfile::TempDir;

fn message(sender: &str, date: &str, text: &str) -> String {
    format!(
        r#"<div class="message default clearfix"><div class="body"><div class="pull_right date details" title="{date}">x</div><div class="from_name">{sender}</div><div class="text">{text}</div></div></div>"#
    )
}

fn joined(date: &str, text: &str) -> String {
    format!(
        r#"<div class="message default clearfix joined"><div class="body"><div class="pull_right date details" title="{date}">x</div><div class="text">{text}</div></div></div>"#
    )
}

fn service(text: &str) -> String {
    format!(r#"<div class="message service"><div class="body details">{text}</div></div>"#)
}

fn write_export(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let html = format!(
        r#"<!DOCTYPE html><html><head><title>Exported Data</title></head><body><div class="page_wrap"><div class="page_header"><div class="content"><div class="text bold">Project X</div></div></div><div class="history">{body}</div></div></body></html>"#
    );
    fs::write(&path, html).unwrap();
    path
}

/// Two-file export where the second file continues the first.
fn split_export() -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let first = write_export(
        dir.path(),
        "messages.html",
        &[
            service("15 January 2024"),
            message("Alice", "15.01.2024 10:00:00 UTC+02:00", "Spec: https://example.com/spec."),
            joined("15.01.2024 10:01:00", "I will send the invoice by Friday"),
            message("Bob", "15.01.2024 10:05:00", "Got it"),
        ]
        .concat(),
    );
    let second = write_export(
        dir.path(),
        "messages2.html",
        &[
            message("Bob", "16.01.2024 09:00:00", "Updated https://example.com/spec"),
            message("Alice, Bob", "16.01.2024 09:01:00", "glued names"),
            message("Carol", "16.01.2024 09:02:00", "Hello"),
        ]
        .concat(),
    );
    (dir, vec![second, first])
}

#[test]
fn test_parse_files_merges_in_path_order() {
    let (_dir, paths) = split_export();
    let parser = TelegramHtmlParser::new();
    let chat = parse_files(&parser, &paths).unwrap();

    assert_eq!(chat.chat_name, "Project X");
    assert_eq!(chat.messages.len(), 7);
    assert_eq!(chat.messages[0].kind, MessageKind::Service);
    assert_eq!(chat.messages[1].content, "Spec: https://example.com/spec.");
    assert_eq!(chat.messages[6].content, "Hello");

    // Joined message inherits Alice
    assert_eq!(chat.messages[2].sender(), Some("Alice"));
    assert_eq!(chat.participants.get("Alice").unwrap().message_count, 2);
    assert_eq!(chat.participants.get("Bob").unwrap().message_count, 2);
}

#[test]
fn test_glued_names_are_pruned() {
    let (_dir, paths) = split_export();
    let chat = parse_files(&TelegramHtmlParser::new(), &paths).unwrap();

    assert!(!chat.participants.contains("Alice, Bob"));
    assert_eq!(chat.participants.names(), vec!["Alice", "Bob", "Carol"]);
    // The message itself survives
    assert!(chat.messages.iter().any(|m| m.content == "glued names"));
}

#[test]
fn test_links_aggregate_across_files() {
    let (_dir, paths) = split_export();
    let chat = parse_files(&TelegramHtmlParser::new(), &paths).unwrap();

    assert_eq!(chat.links.len(), 1);
    let link = &chat.links[0];
    assert_eq!(link.url, "https://example.com/spec");
    assert_eq!(link.mention_count, 2);
    assert_eq!(link.shared_by, vec!["Alice".to_string(), "Bob".to_string()]);
    assert_eq!(link.contexts.len(), 2);
    assert_eq!(link.first_shared.as_ref().unwrap().to_string(), "2024-01-15T10:00:00");
    assert_eq!(link.last_shared.as_ref().unwrap().to_string(), "2024-01-16T09:00:00");
}

#[test]
fn test_date_range_spans_every_file() {
    let (_dir, paths) = split_export();
    let chat = parse_files(&TelegramHtmlParser::new(), &paths).unwrap();
    let range = chat.date_range.unwrap();

    assert_eq!(range.start.to_string(), "2024-01-15 00:00:00");
    assert_eq!(range.end.to_string(), "2024-01-16 09:02:00");
}

#[test]
fn test_import_into_file_database_twice() {
    let (dir, paths) = split_export();
    let db = dir.path().join("data").join("chat.db");
    let parser = TelegramHtmlParser::new();

    {
        let store = SqliteStore::open(&db).unwrap();
        let summary = Ingestor::new(&store, &parser, 2).run(&paths, &|_| {}).unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.messages, 7);
        assert_eq!(summary.participants, 3);
        assert_eq!(summary.links, 1);
    }

    let store = SqliteStore::open(&db).unwrap();
    Ingestor::new(&store, &parser, 200).run(&paths, &|_| {}).unwrap();

    let stats = store.dashboard_stats().unwrap();
    assert_eq!(stats.messages, 14);
    assert_eq!(stats.links, 1);
    assert_eq!(stats.persons, 3);
    assert_eq!(store.find_person("Alice").unwrap().unwrap().total_messages, 4);
    assert!(store.find_person("Alice, Bob").unwrap().is_none());
}

#[test]
fn test_spawned_import_reports_summary() {
    let (dir, paths) = split_export();
    let db = dir.path().join("spawned.db");

    let worker = spawn_ingestion(db.clone(), ExportFormat::TelegramHtml, paths, 200).unwrap();
    let progress = Mutex::new(Vec::new());
    let summary = worker
        .wait_with(|event| {
            if let IngestEvent::Progress(message) = event {
                progress.lock().unwrap().push(message);
            }
        })
        .unwrap();

    assert_eq!(summary.messages, 7);
    assert!(!progress.into_inner().unwrap().is_empty());
    assert_eq!(SqliteStore::open(&db).unwrap().dashboard_stats().unwrap().messages, 7);
}

/// Model double: answers by the JSON key the prompt asks for.
struct CannedModel {
    calls: Mutex<usize>,
}

impl LlmClient for CannedModel {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn complete(&self, prompt: &str) -> chatminer::Result<String> {
        *self.calls.lock().unwrap() += 1;
        let answer = if prompt.contains("\"tasks\"") {
            r#"{"tasks": [{"title": "Send invoice", "assigned_to": "Alice", "priority": "high"}]}"#
        } else if prompt.contains("\"patterns\"") {
            r#"{"patterns": []}"#
        } else if prompt.contains("\"commitments\"") {
            r#"{"role": "teacher", "role_confidence": 0.9,
                "commitments": [{"title": "Send invoice", "type": "promise", "due_date": "Friday"}]}"#
        } else {
            r#"Profile follows. {"role": "collaborator", "role_confidence": 0.75, "summary": "Writes specs"}"#
        };
        Ok(answer.to_string())
    }
}

#[test]
fn test_import_then_analyze() {
    let (_dir, paths) = split_export();
    let store = SqliteStore::open_in_memory().unwrap();
    Ingestor::new(&store, &TelegramHtmlParser::new(), 200)
        .run(&paths, &|_| {})
        .unwrap();

    let model = Arc::new(CannedModel { calls: Mutex::new(0) });
    let extractor = Extractor::new(model.clone());
    let analyzer = Analyzer::new(&store, &extractor, &AppConfig::default());

    let outcome = analyzer.run_bulk(&|_| {}).unwrap();
    // tasks + three profiles + patterns
    assert_eq!(*model.calls.lock().unwrap(), 5);
    assert_eq!(outcome.tasks.len(), 1);
    assert_eq!(outcome.profiles.len(), 3);
    assert!(outcome.patterns.is_empty());
    assert_eq!(store.find_person("Carol").unwrap().unwrap().role, "collaborator");

    let outcome = analyzer.run_person("Alice", &|_| {}).unwrap();
    assert_eq!(outcome.profiles[0].profile.role, PersonRole::Teacher);

    let alice = store.find_person("Alice").unwrap().unwrap();
    assert!(alice.is_analyzed());
    let stats = store.dashboard_stats().unwrap();
    assert_eq!(stats.tasks, 1);
    assert_eq!(stats.commitments, 1);
}

#[test]
fn test_date_window_limits_analysis() {
    let (_dir, paths) = split_export();
    let store = SqliteStore::open_in_memory().unwrap();
    Ingestor::new(&store, &TelegramHtmlParser::new(), 200)
        .run(&paths, &|_| {})
        .unwrap();

    let model = Arc::new(CannedModel { calls: Mutex::new(0) });
    let extractor = Extractor::new(model.clone());
    let filter = MessageFilter::new().with_date_from("2024-01-16").unwrap();
    let analyzer = Analyzer::new(&store, &extractor, &AppConfig::default()).with_filter(filter);

    let outcome = analyzer.run_bulk(&|_| {}).unwrap();

    // Alice only posted on the 15th
    assert_eq!(outcome.skipped, vec!["Alice".to_string()]);
    assert_eq!(outcome.profiles.len(), 2);
    assert_eq!(*model.calls.lock().unwrap(), 4);
}
