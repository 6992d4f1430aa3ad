//! Lenient decoding of model output.
//!
//! Models wrap JSON in prose, in fenced code blocks, or return nothing
//! useful at all. [`extract_json_payload`] locates the JSON text, and the
//! `decode_*` functions map an untyped [`Value`] onto the typed records,
//! substituting a documented default for every missing or ill-typed field:
//!
//! | Field | Default |
//! |-------|---------|
//! | `confidence`, `role_confidence` | 0.5 |
//! | skill `score` | 50 |
//! | skill `category` | `other` |
//! | task `category` | `general` |
//! | task `status` / `priority` | `pending` / `medium` |
//! | `role` | `unknown` |
//! | `sentiment` / `sentiment_score` | `neutral` / 0.0 |
//! | alert `severity` | `medium` |

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::records::{
    AlertType, BehaviorAlert, Commitment, CommitmentType, CommunicationPattern,
    DEFAULT_CONFIDENCE, DEFAULT_SKILL_SCORE, ExtractedTask, PatternType, PersonProfile, PersonRole,
    Priority, Sentiment, Severity, Skill, SkillCategory, TaskCategory, TaskStatus, clamp_confidence,
    clamp_score, clamp_sentiment_score,
};

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fenced block pattern is valid")
});

/// Locates the JSON text inside a model response.
///
/// Tries, in order: the interior of the first fenced code block, the first
/// balanced `{...}` span, then the whole (trimmed) text.
///
/// ```
/// use chatminer::extract::extract_json_payload;
///
/// let text = "Sure! Here you go:\n```json\n{\"tasks\": []}\n```\nAnything else?";
/// assert_eq!(extract_json_payload(text), "{\"tasks\": []}");
///
/// assert_eq!(extract_json_payload("result: {\"a\": {\"b\": 1}} done"), "{\"a\": {\"b\": 1}}");
/// ```
pub fn extract_json_payload(text: &str) -> &str {
    if let Some(inner) = FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        let inner = inner.as_str().trim();
        if !inner.is_empty() {
            return inner;
        }
    }
    if let Some(span) = balanced_object(text) {
        return span;
    }
    text.trim()
}

/// First `{...}` span whose braces balance, ignoring braces inside strings.
///
/// An unterminated object falls back to the widest `{ ... }` span.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (i, b) in text.bytes().enumerate().skip(start) {
        if escape {
            escape = false;
            continue;
        }
        if b == b'\\' && in_string {
            escape = true;
            continue;
        }
        if b == b'"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parses a model response into a JSON value.
pub fn parse_response(text: &str) -> serde_json::Result<Value> {
    serde_json::from_str(extract_json_payload(text))
}

// ============================================================================
// Field helpers
// ============================================================================

/// String field; numbers and booleans are stringified, anything else is empty.
pub(crate) fn text_field(obj: &Value, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Optional string field; empty strings and `"null"`-like placeholders are `None`.
pub(crate) fn optional_text(obj: &Value, key: &str) -> Option<String> {
    let text = text_field(obj, key);
    match text.to_lowercase().as_str() {
        "" | "null" | "none" | "n/a" | "ninguno" | "nadie" => None,
        _ => Some(text),
    }
}

/// Numeric field; numeric strings (optionally with `%`) are accepted.
pub(crate) fn number_field(obj: &Value, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

/// List of strings; a single string becomes a one-element list.
pub(crate) fn string_list(obj: &Value, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Object entries of an array field.
pub(crate) fn objects<'a>(obj: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> + 'a {
    obj.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|v| v.is_object())
}

fn confidence_field(obj: &Value, key: &str) -> f64 {
    number_field(obj, key).map_or(DEFAULT_CONFIDENCE, clamp_confidence)
}

// ============================================================================
// Record decoders
// ============================================================================

/// Decodes `{"tasks": [...]}`. Entries without a title are dropped.
pub fn decode_tasks(value: &Value) -> Vec<ExtractedTask> {
    objects(value, "tasks")
        .filter_map(|t| {
            let title = text_field(t, "title");
            if title.is_empty() {
                return None;
            }
            Some(ExtractedTask {
                title,
                description: text_field(t, "description"),
                status: TaskStatus::parse_lenient(&text_field(t, "status")),
                priority: Priority::parse_lenient(&text_field(t, "priority")),
                category: TaskCategory::parse_lenient(&text_field(t, "category")),
                assigned_to: optional_text(t, "assigned_to"),
                source_message: text_field(t, "source_message"),
                due_date: optional_text(t, "due_date"),
                confidence: confidence_field(t, "confidence"),
            })
        })
        .collect()
}

/// Decodes the `skills` array of a profile. Entries without a name are dropped.
pub fn decode_skills(value: &Value) -> Vec<Skill> {
    objects(value, "skills")
        .filter_map(|s| {
            let name = text_field(s, "name");
            if name.is_empty() {
                return None;
            }
            Some(Skill {
                name,
                category: SkillCategory::parse_lenient(&text_field(s, "category")),
                score: number_field(s, "score").map_or(DEFAULT_SKILL_SCORE, clamp_score),
                evidence: text_field(s, "evidence"),
            })
        })
        .collect()
}

/// Decodes the `commitments` array. Entries without a title are dropped.
pub fn decode_commitments(value: &Value) -> Vec<Commitment> {
    objects(value, "commitments")
        .filter_map(|c| {
            let title = text_field(c, "title");
            if title.is_empty() {
                return None;
            }
            Some(Commitment {
                title,
                commitment_type: CommitmentType::parse_lenient(&text_field(c, "type")),
                due_date: optional_text(c, "due_date"),
                evidence: text_field(c, "evidence"),
            })
        })
        .collect()
}

/// Decodes a person profile object.
pub fn decode_profile(value: &Value) -> PersonProfile {
    if !value.is_object() {
        return PersonProfile::default();
    }
    PersonProfile {
        role: PersonRole::parse_lenient(&text_field(value, "role")),
        role_confidence: confidence_field(value, "role_confidence"),
        skills: decode_skills(value),
        summary: text_field(value, "summary"),
        strengths: string_list(value, "strengths"),
        areas_to_improve: string_list(value, "areas_to_improve"),
        recommendations: string_list(value, "recommendations"),
        sentiment: Sentiment::parse_lenient(&text_field(value, "sentiment")),
        sentiment_score: number_field(value, "sentiment_score").map_or(0.0, clamp_sentiment_score),
        commitments: decode_commitments(value),
    }
}

/// Decodes `{"patterns": [...]}`. Entries without a name are dropped.
pub fn decode_patterns(value: &Value) -> Vec<CommunicationPattern> {
    objects(value, "patterns")
        .filter_map(|p| {
            let name = text_field(p, "name");
            if name.is_empty() {
                return None;
            }
            Some(CommunicationPattern {
                name,
                pattern_type: PatternType::parse_lenient(&text_field(p, "type")),
                description: text_field(p, "description"),
                persons_involved: string_list(p, "persons_involved"),
                examples: string_list(p, "examples"),
                recommendations: string_list(p, "recommendations").join("\n"),
            })
        })
        .collect()
}

/// Decodes `{"alerts": [...]}` and drops alerts below the confidence gate.
pub fn decode_alerts(value: &Value) -> Vec<BehaviorAlert> {
    objects(value, "alerts")
        .filter_map(|a| {
            let title = text_field(a, "title");
            if title.is_empty() {
                return None;
            }
            let alert = BehaviorAlert {
                alert_type: AlertType::parse_lenient(&text_field(a, "alert_type")),
                severity: Severity::parse_lenient(&text_field(a, "severity")),
                title,
                description: text_field(a, "description"),
                evidence: text_field(a, "evidence"),
                message_examples: string_list(a, "message_examples"),
                recommendation: text_field(a, "recommendation"),
                confidence: confidence_field(a, "confidence"),
            };
            alert.passes_gate().then_some(alert)
        })
        .collect()
}
