//! Shared link mention extraction.
//!
//! URLs are found by scanning message content with a single pattern; each
//! match has a fixed set of trailing punctuation trimmed off so that
//! `"see https://example.com/docs."` yields `https://example.com/docs`.
//!
//! [`LinkTable`] aggregates mentions by URL, both while parsing one export and
//! while merging several.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::models::{LinkContext, LinkMention};
use crate::message::{RawMessage, Timestamp};

/// Maximum number of message contexts kept per link.
pub const MAX_LINK_CONTEXTS: usize = 3;

/// Maximum characters of message text kept in a context snippet.
pub const SNIPPET_CHARS: usize = 200;

/// Characters trimmed from the end of every URL match.
pub const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '"', '\'', '>'];

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"'`]+"#).expect("URL pattern is valid")
});

/// Trims trailing punctuation from a URL match.
///
/// ```
/// use chatminer::parsing::trim_url;
///
/// assert_eq!(trim_url("https://example.com/a)."), "https://example.com/a");
/// ```
pub fn trim_url(raw: &str) -> &str {
    raw.trim_end_matches(TRAILING_PUNCTUATION)
}

/// Returns the distinct URLs mentioned in `content`, in order of appearance.
pub fn find_urls(content: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for m in URL_PATTERN.find_iter(content) {
        let url = trim_url(m.as_str());
        if url.len() <= "www.".len() || url.ends_with("://") {
            continue;
        }
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Link mentions keyed by URL, kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: Vec<LinkMention>,
    index: HashMap<String, usize>,
}

impl LinkTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from already aggregated mentions.
    pub fn from_links(links: Vec<LinkMention>) -> Self {
        let mut table = Self::new();
        for link in links {
            table.absorb(link);
        }
        table
    }

    /// Scans one message and records every URL it mentions.
    pub fn scan(&mut self, msg: &RawMessage) {
        for url in find_urls(&msg.content) {
            self.record(url, msg);
        }
    }

    /// Records a single mention of `url` in `msg`.
    pub fn record(&mut self, url: String, msg: &RawMessage) {
        let context = LinkContext {
            message_snippet: msg.content.chars().take(SNIPPET_CHARS).collect(),
            sender: msg.sender.clone(),
            timestamp: msg.timestamp.clone(),
        };

        if let Some(&idx) = self.index.get(&url) {
            let link = &mut self.links[idx];
            link.mention_count += 1;
            if let Some(sender) = &msg.sender {
                add_sender(&mut link.shared_by, sender);
            }
            if link.contexts.len() < MAX_LINK_CONTEXTS {
                link.contexts.push(context);
            }
            if msg.timestamp.is_some() {
                link.last_shared = later(link.last_shared.take(), msg.timestamp.clone());
            }
            return;
        }

        self.index.insert(url.clone(), self.links.len());
        self.links.push(LinkMention {
            url,
            shared_by: msg.sender.iter().cloned().collect(),
            contexts: vec![context],
            mention_count: 1,
            first_shared: msg.timestamp.clone(),
            last_shared: msg.timestamp.clone(),
        });
    }

    /// Folds an aggregated mention into the table.
    ///
    /// A new URL is appended as-is. An existing URL adds the mention count,
    /// unions `shared_by` (first-seen order), keeps the earliest
    /// `first_shared` and latest `last_shared`, and tops contexts up to
    /// [`MAX_LINK_CONTEXTS`].
    pub fn absorb(&mut self, other: LinkMention) {
        let Some(&idx) = self.index.get(&other.url) else {
            self.index.insert(other.url.clone(), self.links.len());
            self.links.push(other);
            return;
        };

        let link = &mut self.links[idx];
        link.mention_count += other.mention_count;
        for sender in &other.shared_by {
            add_sender(&mut link.shared_by, sender);
        }
        let room = MAX_LINK_CONTEXTS.saturating_sub(link.contexts.len());
        link.contexts.extend(other.contexts.into_iter().take(room));
        link.first_shared = earlier(link.first_shared.take(), other.first_shared);
        link.last_shared = later(link.last_shared.take(), other.last_shared);
    }

    /// Number of distinct URLs.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if no links were recorded.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Looks up a mention by URL.
    pub fn get(&self, url: &str) -> Option<&LinkMention> {
        self.index.get(url).map(|&idx| &self.links[idx])
    }

    /// Consumes the table, returning mentions in first-seen order.
    pub fn into_vec(self) -> Vec<LinkMention> {
        self.links
    }
}

fn add_sender(shared_by: &mut Vec<String>, sender: &str) {
    if !shared_by.iter().any(|s| s == sender) {
        shared_by.push(sender.to_string());
    }
}

/// Earliest of two timestamps; unparsed values lose to parsed ones.
fn earlier(a: Option<Timestamp>, b: Option<Timestamp>) -> Option<Timestamp> {
    match (a, b) {
        (Some(a), Some(b)) => match (a.as_datetime(), b.as_datetime()) {
            (Some(x), Some(y)) if y < x => Some(b),
            (None, Some(_)) => Some(b),
            _ => Some(a),
        },
        (a, b) => a.or(b),
    }
}

/// Latest of two timestamps; when either is unparsed the newer input wins.
fn later(a: Option<Timestamp>, b: Option<Timestamp>) -> Option<Timestamp> {
    match (a, b) {
        (Some(a), Some(b)) => match (a.as_datetime(), b.as_datetime()) {
            (Some(x), Some(y)) if y < x => Some(a),
            _ => Some(b),
        },
        (a, b) => b.or(a),
    }
}
