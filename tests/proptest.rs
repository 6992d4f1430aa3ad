//! Property-based tests for chatminer.
//!
//! These tests generate random inputs to find edge cases.

use proptest::prelude::*;

use chatminer::core::merge::merge_chats;
use chatminer::core::models::ParsedChat;
use chatminer::core::sampler::{sample_indices, sample_messages};
use chatminer::extract::extract_json_payload;
use chatminer::parsers::{ChatParser, TelegramHtmlParser};
use chatminer::parsing::{find_urls, normalize_timestamp, trim_url};

/// Small HTML export built from (sender index, text index) pairs.
fn arb_export() -> impl Strategy<Value = String> {
    prop::collection::vec((0usize..4, 0usize..6), 0..20).prop_map(|rows| {
        const SENDERS: &[&str] = &["Alice", "Bob", "Иван", "A, B"];
        const TEXTS: &[&str] = &[
            "Hello",
            "see https://example.com/a.",
            "www.test.io, ok",
            "🎉🔥 emoji",
            "   ",
            "plain",
        ];
        rows.into_iter()
            .map(|(s, t)| {
                format!(
                    r#"<div class="message"><div class="from_name">{}</div><div class="text">{}</div></div>"#,
                    SENDERS[s], TEXTS[t]
                )
            })
            .collect()
    })
}

fn parse(html: &str) -> ParsedChat {
    TelegramHtmlParser::new().parse_str(html).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // ============================================
    // SAMPLER PROPERTIES
    // ============================================

    /// Short histories pass through unchanged
    #[test]
    fn sampler_passthrough_when_under_cap(len in 0usize..300, extra in 0usize..100) {
        let history: Vec<usize> = (0..len).collect();
        prop_assert_eq!(sample_messages(&history, len + extra), history);
    }

    /// Long histories yield exactly the cap
    #[test]
    fn sampler_returns_exactly_cap(max in 1usize..400, extra in 1usize..2000) {
        let len = max + extra;
        prop_assert_eq!(sample_indices(len, max).len(), max);
    }

    /// Indices ascend strictly, so they are unique and chronological
    #[test]
    fn sampler_indices_ascend(max in 1usize..400, extra in 1usize..2000) {
        let indices = sample_indices(max + extra, max);
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(indices.iter().all(|&i| i < max + extra));
    }

    /// The newest 40% of the budget is the tail of the history
    #[test]
    fn sampler_keeps_recent_tail(max in 1usize..400, extra in 1usize..2000) {
        let len = max + extra;
        let recent = max * 4 / 10;
        let indices = sample_indices(len, max);
        let expected: Vec<usize> = (len - recent..len).collect();
        prop_assert_eq!(&indices[max - recent..], &expected[..]);
    }

    // ============================================
    // PARSER PROPERTIES
    // ============================================

    /// Participant counts never exceed the messages parsed
    #[test]
    fn participant_counts_bounded(html in arb_export()) {
        let chat = parse(&html);
        let counted: usize = chat.participants.iter().map(|p| p.message_count).sum();
        prop_assert!(counted <= chat.message_count());
        prop_assert!(chat.participants.iter().all(|p| p.message_count > 0 && !p.name.contains(',')));
    }

    /// Every link is mentioned at least once and has distinct sharers
    #[test]
    fn links_are_consistent(html in arb_export()) {
        let chat = parse(&html);
        for link in &chat.links {
            prop_assert!(link.mention_count >= 1);
            prop_assert!(link.contexts.len() <= 3);
            let mut sharers = link.shared_by.clone();
            sharers.sort();
            sharers.dedup();
            prop_assert_eq!(sharers.len(), link.shared_by.len());
        }
    }

    /// Merging keeps every message and sums participant counts
    #[test]
    fn merge_preserves_totals(a in arb_export(), b in arb_export()) {
        let (left, right) = (parse(&a), parse(&b));
        let expected_messages = left.message_count() + right.message_count();
        let expected_alice = left.participants.get("Alice").map_or(0, |p| p.message_count)
            + right.participants.get("Alice").map_or(0, |p| p.message_count);

        let merged = merge_chats([left, right]);
        prop_assert_eq!(merged.message_count(), expected_messages);
        prop_assert_eq!(
            merged.participants.get("Alice").map_or(0, |p| p.message_count),
            expected_alice
        );
    }

    // ============================================
    // NEVER PANIC
    // ============================================

    /// Arbitrary markup never panics the parser
    #[test]
    fn parser_never_panics(content in ".{0,300}") {
        let _ = TelegramHtmlParser::new().parse_str(&content);
    }

    /// Arbitrary text never panics date normalization
    #[test]
    fn dates_never_panic(input in ".{0,60}") {
        let _ = normalize_timestamp(&input);
    }

    /// Payload extraction returns a substring and never panics
    #[test]
    fn payload_is_substring(text in ".{0,200}") {
        let payload = extract_json_payload(&text);
        prop_assert!(text.contains(payload));
    }

    /// Found URLs are already trimmed
    #[test]
    fn urls_are_trimmed(text in ".{0,200}") {
        for url in find_urls(&text) {
            prop_assert_eq!(trim_url(&url), url.as_str());
        }
    }
}
