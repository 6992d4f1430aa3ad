//! Telegram Desktop HTML export parser.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::ChatParser;
use crate::core::models::{DateRange, ParsedChat, ParticipantTable};
use crate::error::{ChatminerError, Result};
use crate::message::{MessageKind, RawMessage, Timestamp};
use crate::parsing::LinkTable;
use crate::parsing::html::{child_with_class, element_text, first_text, has_class, selector};

static MESSAGE: LazyLock<Selector> = LazyLock::new(|| selector(".message"));
static MESSAGE_FALLBACK: LazyLock<Selector> = LazyLock::new(|| selector(".message_default"));
static DATE: LazyLock<Selector> = LazyLock::new(|| selector(".date"));
static TEXT: LazyLock<Selector> = LazyLock::new(|| selector(".text"));
static SERVICE_BODY: LazyLock<Selector> = LazyLock::new(|| selector(".body.details"));
static HEADER_TEXT: LazyLock<Selector> = LazyLock::new(|| selector(".page_header .text"));
static HEADER: LazyLock<Selector> = LazyLock::new(|| selector(".page_header"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));

/// Parser for Telegram Desktop HTML exports.
///
/// Telegram writes each chat as one or more `messages*.html` files:
/// ```html
/// <div class="page_header"><div class="text bold">Project X</div></div>
/// <div class="message service"><div class="body details">15 January 2024</div></div>
/// <div class="message default clearfix">
///   <div class="body">
///     <div class="pull_right date details" title="15.01.2024 10:30:00 UTC+02:00">10:30</div>
///     <div class="from_name">Alice</div>
///     <div class="text">Hello</div>
///   </div>
/// </div>
/// <div class="message default clearfix joined">
///   <div class="body"><div class="text">Same sender, no label</div></div>
/// </div>
/// ```
///
/// A `joined` message has no `.from_name`; its sender is the one of the
/// previous regular message. Only the message's own label counts: the
/// `.from_name` inside a `.forwarded` block names the original author. Service entries never carry a sender and do not
/// change the carried-forward sender.
pub struct TelegramHtmlParser;

impl TelegramHtmlParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_document(document: &Html) -> ParsedChat {
        let mut elements: Vec<ElementRef<'_>> = document.select(&MESSAGE).collect();
        if elements.is_empty() {
            elements = document.select(&MESSAGE_FALLBACK).collect();
        }

        let mut messages = Vec::with_capacity(elements.len());
        let mut current_sender: Option<String> = None;
        for el in elements {
            if let Some(msg) = parse_message(el, &mut current_sender) {
                messages.push(msg);
            }
        }

        let mut participants = ParticipantTable::new();
        let mut links = LinkTable::new();
        for msg in &messages {
            if let Some(sender) = msg.sender() {
                participants.record(sender, msg.timestamp());
            }
            links.scan(msg);
        }
        participants.prune();

        debug!(
            messages = messages.len(),
            participants = participants.len(),
            links = links.len(),
            "parsed Telegram HTML export"
        );

        ParsedChat {
            chat_name: chat_name(document),
            date_range: DateRange::of(&messages),
            messages,
            participants,
            links: links.into_vec(),
        }
    }
}

impl Default for TelegramHtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatParser for TelegramHtmlParser {
    fn name(&self) -> &'static str {
        "Telegram HTML"
    }

    fn parse(&self, path: &Path) -> Result<ParsedChat> {
        if !path.exists() {
            return Err(ChatminerError::not_found(path));
        }
        let content = fs::read_to_string(path)?;
        self.parse_str(&content)
    }

    fn parse_str(&self, content: &str) -> Result<ParsedChat> {
        let document = Html::parse_document(content);
        Ok(Self::parse_document(&document))
    }
}

/// Parses one message container, updating the carried-forward sender.
fn parse_message(el: ElementRef<'_>, current_sender: &mut Option<String>) -> Option<RawMessage> {
    if has_class(el, "service") {
        let text = first_text(el, &SERVICE_BODY).unwrap_or_else(|| element_text(el));
        if text.is_empty() {
            return None;
        }
        let timestamp = Timestamp::parse(&text);
        let mut msg = RawMessage::service(text);
        if timestamp.is_parsed() {
            msg = msg.with_timestamp(timestamp);
        }
        return Some(msg);
    }

    if let Some(name) = sender_label(el) {
        *current_sender = Some(name);
    }

    let content = first_text(el, &TEXT)?;
    let timestamp = el.select(&DATE).next().and_then(|date| {
        let raw = date
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or_else(|| element_text(date), str::to_string);
        (!raw.is_empty()).then(|| Timestamp::parse(&raw))
    });

    Some(RawMessage {
        sender: current_sender.clone(),
        content,
        timestamp,
        kind: MessageKind::Text,
    })
}

/// `.from_name` placed directly in the container or in its `.body`.
fn sender_label(el: ElementRef<'_>) -> Option<String> {
    child_with_class(el, "from_name")
        .or_else(|| child_with_class(el, "body").and_then(|body| child_with_class(body, "from_name")))
        .map(element_text)
        .filter(|name| !name.is_empty())
}

/// Chat name from the structured header, the plain header, or the page title.
fn chat_name(document: &Html) -> String {
    [&*HEADER_TEXT, &*HEADER, &*TITLE]
        .into_iter()
        .find_map(|sel| document.select(sel).next().map(element_text).filter(|t| !t.is_empty()))
        .unwrap_or_default()
}
