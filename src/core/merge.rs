//! Combining several parsed exports into one chat.
//!
//! Telegram splits long histories into `messages.html`, `messages2.html`, ...
//! Files are merged in lexicographic path order so the combined message
//! stream is reproducible:
//!
//! - messages are concatenated in file order
//! - participants with the same name have their counts summed
//! - links with the same URL have their mention counts summed, `shared_by`
//!   unioned, and contexts topped up to three per merge step

use std::path::{Path, PathBuf};

use super::models::ParsedChat;
use crate::error::Result;
use crate::parsers::ChatParser;
use crate::parsing::LinkTable;

/// Incremental accumulator over parsed exports.
///
/// # Example
///
/// ```rust
/// use chatminer::core::merge::ChatMerger;
/// use chatminer::parsers::{ChatParser, TelegramHtmlParser};
///
/// # fn main() -> chatminer::Result<()> {
/// let parser = TelegramHtmlParser::new();
/// let mut merger = ChatMerger::new();
/// merger.push(parser.parse_str(r#"<div class="message"><div class="from_name">Ann</div><div class="text">hi</div></div>"#)?);
/// merger.push(parser.parse_str(r#"<div class="message"><div class="from_name">Ann</div><div class="text">bye</div></div>"#)?);
///
/// let chat = merger.finish();
/// assert_eq!(chat.messages.len(), 2);
/// assert_eq!(chat.participants.get("Ann").unwrap().message_count, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ChatMerger {
    chat: ParsedChat,
    links: LinkTable,
    files: usize,
}

impl ChatMerger {
    /// Creates an empty merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one parsed export into the accumulator.
    pub fn push(&mut self, mut next: ParsedChat) {
        self.files += 1;

        if self.files == 1 {
            self.links = LinkTable::from_links(std::mem::take(&mut next.links));
            self.chat = next;
            return;
        }

        if self.chat.chat_name.is_empty() {
            self.chat.chat_name = next.chat_name;
        }
        self.chat.messages.append(&mut next.messages);

        let participants: Vec<_> = next.participants.into();
        for participant in participants {
            self.chat.participants.absorb(participant);
        }
        for link in next.links {
            self.links.absorb(link);
        }

        self.chat.date_range = match (self.chat.date_range, next.date_range) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        };
    }

    /// Number of exports pushed so far.
    pub fn files(&self) -> usize {
        self.files
    }

    /// Returns the combined chat.
    pub fn finish(self) -> ParsedChat {
        let mut chat = self.chat;
        chat.links = self.links.into_vec();
        chat
    }
}

/// Merges already parsed exports in the given order.
pub fn merge_chats(chats: impl IntoIterator<Item = ParsedChat>) -> ParsedChat {
    let mut merger = ChatMerger::new();
    for chat in chats {
        merger.push(chat);
    }
    merger.finish()
}

/// Returns `paths` in the order they are merged.
pub fn merge_order<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut sorted: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
    sorted.sort();
    sorted
}

/// Parses every file with `parser` and merges them in sorted path order.
///
/// Fails on the first file that cannot be parsed.
pub fn parse_files<P: AsRef<Path>>(parser: &dyn ChatParser, paths: &[P]) -> Result<ParsedChat> {
    let mut merger = ChatMerger::new();
    for path in merge_order(paths) {
        merger.push(parser.parse(&path)?);
    }
    Ok(merger.finish())
}

/// Counts describing a merged chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub files: usize,
    pub messages: usize,
    pub participants: usize,
    pub links: usize,
}

impl MergeStats {
    /// Collects the counts of `chat`, built from `files` exports.
    pub fn of(chat: &ParsedChat, files: usize) -> Self {
        Self {
            files,
            messages: chat.messages.len(),
            participants: chat.participants.len(),
            links: chat.links.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::TelegramHtmlParser;

    fn chat(html: &str) -> ParsedChat {
        TelegramHtmlParser::new().parse_str(html).unwrap()
    }

    fn msg(sender: &str, date: &str, text: &str) -> String {
        format!(
            r#"<div class="message"><div class="date" title="{date}"></div><div class="from_name">{sender}</div><div class="text">{text}</div></div>"#
        )
    }

    #[test]
    fn test_merge_appends_messages_in_order() {
        let a = chat(&msg("Alice", "01.01.2024 10:00", "first"));
        let b = chat(&(msg("Bob", "02.01.2024 10:00", "second") + &msg("Alice", "03.01.2024 10:00", "third")));
        let merged = merge_chats([a, b]);

        let contents: Vec<_> = merged.messages.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(merged.participants.names(), vec!["Alice", "Bob"]);
        assert_eq!(merged.participants.get("Alice").unwrap().message_count, 2);

        let range = merged.date_range.unwrap();
        assert_eq!(range.start.to_string(), "2024-01-01 10:00:00");
        assert_eq!(range.end.to_string(), "2024-01-03 10:00:00");
    }

    #[test]
    fn test_merge_same_url_across_files() {
        let a = chat(&msg("Alice", "01.01.2024 10:00", "look https://x.dev"));
        let b = chat(&(msg("Alice", "02.01.2024 10:00", "again https://x.dev.") + &msg("Bob", "02.01.2024 11:00", "https://y.dev")));
        let merged = merge_chats([a, b]);

        assert_eq!(merged.links.len(), 2);
        let x = &merged.links[0];
        assert_eq!(x.url, "https://x.dev");
        assert_eq!(x.mention_count, 2);
        assert_eq!(x.shared_by, vec!["Alice"]);
        assert_eq!(x.contexts.len(), 2);
        assert_eq!(merged.links[1].url, "https://y.dev");
    }

    #[test]
    fn test_merge_keeps_first_chat_name() {
        let mut a = chat(&msg("Alice", "01.01.2024 10:00", "x"));
        a.chat_name = "Team".into();
        let mut b = chat(&msg("Alice", "01.01.2024 10:00", "y"));
        b.chat_name = "Other".into();
        assert_eq!(merge_chats([a, b]).chat_name, "Team");
    }

    #[test]
    fn test_merge_empty_input() {
        let merged = merge_chats(Vec::new());
        assert!(merged.messages.is_empty());
        assert!(merged.participants.is_empty());
    }

    #[test]
    fn test_merge_order_is_lexicographic() {
        let order = merge_order(&["b/messages2.html", "a/messages.html", "b/messages.html"]);
        let names: Vec<_> = order.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["a/messages.html", "b/messages.html", "b/messages2.html"]);
    }

    #[test]
    fn test_parse_files_missing_path() {
        let err = parse_files(&TelegramHtmlParser::new(), &["/nope/messages.html"]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_merge_stats() {
        let a = chat(&(msg("Alice", "01.01.2024 10:00", "x") + &msg("Bob", "01.01.2024 10:05", "y")));
        let b = chat(&msg("Alice", "01.01.2024 10:00", "z"));
        let merged = merge_chats([a, b]);
        let stats = MergeStats::of(&merged, 2);
        assert_eq!(stats, MergeStats { files: 2, messages: 3, participants: 2, links: 0 });
    }
}
