//! Edge case tests for malformed exports and unhelpful model output.

use std::sync::Arc;

use chatminer::extract::{PersonRole, extract_json_payload, parse_response};
use chatminer::parsing::{find_urls, normalize_timestamp};
use chatminer::prelude::*;

fn parse(html: &str) -> ParsedChat {
    TelegramHtmlParser::new().parse_str(html).unwrap()
}

// =========================================================================
// Dates
// =========================================================================

#[test]
fn test_equivalent_dates_normalize_identically() {
    let expected = normalize_timestamp("01.02.2023 10:00");
    assert!(expected.is_parsed());
    assert_eq!(normalize_timestamp("2023-02-01 10:00:00"), expected);
    assert_eq!(normalize_timestamp("01/02/2023 10:00 UTC+02:00"), expected);
    assert_eq!(normalize_timestamp("  01.02.2023 10:00:00 UTC-05:00 "), expected);
}

#[test]
fn test_unknown_date_is_kept_verbatim() {
    let ts = normalize_timestamp("yesterday at noon");
    assert!(!ts.is_parsed());
    assert_eq!(ts, Timestamp::Raw("yesterday at noon".to_string()));
    assert_eq!(ts.to_string(), "yesterday at noon");
}

#[test]
fn test_raw_dates_never_pass_a_date_window() {
    let chat = parse(
        r#"<div class="message"><div class="date" title="someday"></div><div class="from_name">Ann</div><div class="text">hi</div></div>"#,
    );
    let filter = MessageFilter::new().with_date_from("2000-01-01").unwrap();
    assert!(filter.apply(&chat.messages).is_empty());
    assert_eq!(MessageFilter::new().apply(&chat.messages).len(), 1);
}

// =========================================================================
// Export markup
// =========================================================================

#[test]
fn test_empty_document() {
    let chat = parse("");
    assert!(chat.messages.is_empty());
    assert!(chat.participants.is_empty());
    assert!(chat.links.is_empty());
    assert!(chat.date_range.is_none());
}

#[test]
fn test_whitespace_and_media_only_messages_dropped() {
    let chat = parse(
        r#"
        <div class="message"><div class="from_name">Ann</div><div class="text">   </div></div>
        <div class="message joined"><div class="media_wrap">photo</div></div>
        <div class="message joined"><div class="text">kept</div></div>"#,
    );
    assert_eq!(chat.message_count(), 1);
    assert_eq!(chat.messages[0].content, "kept");
    assert_eq!(chat.participants.get("Ann").unwrap().message_count, 1);
}

#[test]
fn test_joined_message_without_prior_sender() {
    let chat = parse(r#"<div class="message joined"><div class="text">orphan</div></div>"#);
    assert_eq!(chat.message_count(), 1);
    assert_eq!(chat.messages[0].sender(), None);
    assert!(chat.participants.is_empty());
}

#[test]
fn test_service_entry_does_not_reset_sender() {
    let chat = parse(
        r#"
        <div class="message"><div class="from_name">Ann</div><div class="text">one</div></div>
        <div class="message service"><div class="body details">2 March 2024</div></div>
        <div class="message joined"><div class="text">two</div></div>"#,
    );
    assert_eq!(chat.messages[1].kind, MessageKind::Service);
    assert_eq!(chat.messages[1].sender(), None);
    assert_eq!(chat.messages[2].sender(), Some("Ann"));
}

#[test]
fn test_line_breaks_and_entities() {
    let chat = parse(
        r#"<div class="message"><div class="from_name">Tom &amp; Jerry</div><div class="text">a &lt;b&gt;<br>second   line</div></div>"#,
    );
    assert_eq!(chat.messages[0].sender(), Some("Tom & Jerry"));
    assert_eq!(chat.messages[0].content, "a <b>\nsecond line");
}

#[test]
fn test_overlong_name_pruned() {
    let long = "N".repeat(51);
    let ok = "N".repeat(50);
    let chat = parse(&format!(
        r#"<div class="message"><div class="from_name">{long}</div><div class="text">x</div></div>
           <div class="message"><div class="from_name">{ok}</div><div class="text">y</div></div>"#
    ));
    assert!(!chat.participants.contains(&long));
    assert!(chat.participants.contains(&ok));
}

#[test]
fn test_fallback_container_class() {
    let chat = parse(
        r#"<div class="message_default"><div class="from_name">Carol</div><div class="text">hello</div></div>"#,
    );
    assert_eq!(chat.message_count(), 1);
    assert_eq!(chat.messages[0].sender(), Some("Carol"));
}

// =========================================================================
// Links
// =========================================================================

#[test]
fn test_url_punctuation_and_www() {
    assert_eq!(
        find_urls("(see www.example.com), and https://a.io/x?q=1."),
        vec!["www.example.com".to_string(), "https://a.io/x?q=1".to_string()]
    );
    assert!(find_urls("nothing here, just http:// and www.").is_empty());
}

#[test]
fn test_repeated_url_in_one_message_counts_once() {
    let chat = parse(
        r#"<div class="message"><div class="from_name">Ann</div><div class="text">https://a.io https://a.io</div></div>"#,
    );
    assert_eq!(chat.links.len(), 1);
    assert_eq!(chat.links[0].mention_count, 1);
}

// =========================================================================
// Model output
// =========================================================================

#[test]
fn test_payload_edge_cases() {
    assert_eq!(extract_json_payload("```\n```\n{\"a\": 1}"), "{\"a\": 1}");
    assert_eq!(extract_json_payload("   no json   "), "no json");
    assert!(parse_response("I could not find anything.").is_err());
}

struct Failing;

impl LlmClient for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn complete(&self, _prompt: &str) -> chatminer::Result<String> {
        Err(ChatminerError::llm("failing", "HTTP 503"))
    }
}

struct Prose;

impl LlmClient for Prose {
    fn name(&self) -> &'static str {
        "prose"
    }

    fn complete(&self, _prompt: &str) -> chatminer::Result<String> {
        Ok("Sorry, I can't help with that.".to_string())
    }
}

#[test]
fn test_failed_or_prose_answers_decode_to_defaults() {
    let messages = vec![RawMessage::new("Ann", "I'll ship it Friday")];

    let clients: Vec<Arc<dyn LlmClient>> = vec![Arc::new(Failing), Arc::new(Prose)];
    for client in clients {
        let extractor = Extractor::new(client);
        assert!(extractor.extract_tasks(&messages).is_empty());
        assert!(extractor.detect_patterns(&messages, &["Ann"]).is_empty());

        let profile = extractor.profile_person("Ann", &messages, false);
        assert_eq!(profile.role, PersonRole::Unknown);
        assert!(profile.is_empty());
    }
}

#[test]
fn test_config_rejects_zero_checkpoint() {
    assert!(AppConfig::from_toml_str("[ingest]\ncheckpoint_every = 0\n").is_err());

    let config = AppConfig::from_toml_str("[sampling]\npatterns = 50\n").unwrap();
    assert_eq!(config.sampling.patterns, 50);
    assert_eq!(config.sampling.chat_tasks, 150);
}
