//! Prompt contracts for each extraction kind.
//!
//! Every prompt is one combined text: fixed instructions that spell out the
//! exact JSON shape and the closed vocabulary of each enum field, followed by
//! the rendered messages. Vocabularies are generated from the record enums so
//! the prompt and the decoder cannot drift apart.

use super::records::{
    AlertType, CommitmentType, PatternType, PersonRole, Priority, Sentiment, Severity,
    SkillCategory, TaskCategory, TaskStatus,
};
use crate::message::RawMessage;

/// Sender label used for messages without one.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Characters of the timestamp shown per line (`YYYY-MM-DDTHH:MM`).
const TIMESTAMP_CHARS: usize = 16;

const JSON_ONLY: &str = "Respond ONLY with valid JSON. No prose, no markdown.";

/// Renders messages as `[timestamp] sender: content` lines.
///
/// With `include_sender` off the sender is elided: `[timestamp] content`.
///
/// ```
/// use chatminer::extract::prompt::format_messages;
/// use chatminer::{RawMessage, Timestamp};
///
/// let msgs = vec![RawMessage::new("Ana", "hola").with_timestamp(Timestamp::parse("01.02.2023 10:00:59"))];
/// assert_eq!(format_messages(&msgs, true), "[2023-02-01T10:00] Ana: hola");
/// assert_eq!(format_messages(&msgs, false), "[2023-02-01T10:00] hola");
/// ```
pub fn format_messages(messages: &[RawMessage], include_sender: bool) -> String {
    messages
        .iter()
        .map(|msg| {
            let ts: String = msg
                .timestamp()
                .map(|t| t.to_string().chars().take(TIMESTAMP_CHARS).collect())
                .unwrap_or_default();
            if include_sender {
                format!("[{ts}] {}: {}", msg.sender().unwrap_or(UNKNOWN_SENDER), msg.content())
            } else {
                format!("[{ts}] {}", msg.content())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn combine(instructions: &str, request: &str, transcript: &str) -> String {
    format!("{instructions}\n\n{request}\n\n{transcript}\n\n{JSON_ONLY}")
}

fn main_user_note(is_me: bool) -> &'static str {
    if is_me {
        "\nThis is the profile of the MAIN USER of the tool. Be especially thorough about:\n\
         - clear strengths\n\
         - constructive areas to improve\n\
         - actionable recommendations\n"
    } else {
        ""
    }
}

fn skill_shape() -> String {
    format!(
        r#"{{"name": "skill name", "category": "{}", "score": 0-100, "evidence": "quote or paraphrase from the chat"}}"#,
        SkillCategory::vocabulary()
    )
}

/// Chat-wide task extraction.
pub fn tasks_prompt(messages: &[RawMessage]) -> String {
    let instructions = format!(
        r#"You are an expert in conversation analysis and project management.
Identify EVERY task, commitment, pending item and action mentioned in the conversation, explicit or implicit.

Categories: {categories}

{JSON_ONLY}
{{
  "tasks": [
    {{
      "title": "short actionable title",
      "description": "detailed description",
      "status": "{status}",
      "priority": "{priority}",
      "category": "{categories}",
      "assigned_to": "name of the person who must do it, or null",
      "source_message": "original message where it was mentioned",
      "due_date": "YYYY-MM-DD or null",
      "confidence": 0.0-1.0
    }}
  ]
}}

IMPORTANT: assigned_to is WHO must do the task, not who mentioned it."#,
        categories = TaskCategory::vocabulary(),
        status = TaskStatus::vocabulary(),
        priority = Priority::vocabulary(),
    );
    combine(
        &instructions,
        "Analyze this conversation and extract ALL tasks:",
        &format_messages(messages, true),
    )
}

/// Profile of one participant from their own messages.
pub fn profile_prompt(name: &str, messages: &[RawMessage], is_me: bool) -> String {
    let instructions = format!(
        r#"Analyze the messages of one person and produce a detailed professional profile.
{note}
{JSON_ONLY}
{{
  "role": "{roles}",
  "role_confidence": 0.0-1.0,
  "skills": [
    {skill}
  ],
  "summary": "professional summary in 2-3 sentences",
  "strengths": ["strength 1", "strength 2", "strength 3"],
  "areas_to_improve": ["area 1", "area 2"],
  "recommendations": ["actionable recommendation 1", "recommendation 2"],
  "sentiment": "{sentiment}",
  "sentiment_score": -1.0-1.0
}}"#,
        note = main_user_note(is_me),
        roles = PersonRole::vocabulary(),
        skill = skill_shape(),
        sentiment = Sentiment::vocabulary(),
    );
    combine(
        &instructions,
        &format!("Build the professional profile of {name} from their messages:"),
        &format_messages(messages, false),
    )
}

/// Profile plus the promises, agreements and deadlines a participant stated.
pub fn profile_with_commitments_prompt(name: &str, messages: &[RawMessage], is_me: bool) -> String {
    let instructions = format!(
        r#"Analyze the messages of one person. Produce a professional profile and list every commitment they made: promises, agreements and deadlines.
{note}
{JSON_ONLY}
{{
  "role": "{roles}",
  "role_confidence": 0.0-1.0,
  "skills": [
    {skill}
  ],
  "summary": "professional summary in 2-3 sentences",
  "strengths": ["strength 1", "strength 2"],
  "areas_to_improve": ["area 1", "area 2"],
  "recommendations": ["actionable recommendation 1"],
  "sentiment": "{sentiment}",
  "sentiment_score": -1.0-1.0,
  "commitments": [
    {{"title": "what was promised", "type": "{commitment}", "due_date": "YYYY-MM-DD or null", "evidence": "message where it was stated"}}
  ]
}}"#,
        note = main_user_note(is_me),
        roles = PersonRole::vocabulary(),
        skill = skill_shape(),
        sentiment = Sentiment::vocabulary(),
        commitment = CommitmentType::vocabulary(),
    );
    combine(
        &instructions,
        &format!("Analyze the profile and commitments of {name} from their messages:"),
        &format_messages(messages, false),
    )
}

/// Chat-wide communication patterns.
pub fn patterns_prompt(messages: &[RawMessage], participants: &[&str]) -> String {
    let instructions = format!(
        r#"Identify communication patterns, group dynamics and recurring topics.
Be specific and give actionable recommendations.
Participants: {people}

{JSON_ONLY}
{{
  "patterns": [
    {{
      "name": "descriptive name of the pattern",
      "type": "{types}",
      "description": "detailed description of what was observed",
      "persons_involved": ["person 1", "person 2"],
      "examples": ["concrete example from the chat"],
      "recommendations": "actionable recommendation to improve or leverage this pattern"
    }}
  ]
}}"#,
        people = participants.join(", "),
        types = PatternType::vocabulary(),
    );
    combine(
        &instructions,
        "Analyze the communication patterns in this conversation:",
        &format_messages(messages, true),
    )
}

/// Behavior alerts about one participant.
pub fn behavior_alerts_prompt(name: &str, messages: &[RawMessage]) -> String {
    let instructions = format!(
        r#"You review the messages of one person for interpersonal warning signs.
Alert types:
- inconsistency: contradicts earlier statements or commitments
- knowledge_abuse: repeatedly extracts expertise or free work without reciprocity
- emotional_manipulation: guilt, pressure or flattery used to steer others
- possible_lies: claims that conflict with other messages or are implausible
- red_flags: any other concerning behavior

Only report what the messages support. Report a confidence for each alert; weak suspicions must get a low confidence.

{JSON_ONLY}
{{
  "alerts": [
    {{
      "alert_type": "{types}",
      "severity": "{severity}",
      "title": "short title",
      "description": "what was observed",
      "evidence": "why it matters",
      "message_examples": ["quoted message"],
      "recommendation": "how to respond",
      "confidence": 0.0-1.0
    }}
  ]
}}

If there is nothing to report, return {{"alerts": []}}."#,
        types = AlertType::vocabulary(),
        severity = Severity::vocabulary(),
    );
    combine(
        &instructions,
        &format!("Review the messages of {name}:"),
        &format_messages(messages, false),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Timestamp;

    fn msgs() -> Vec<RawMessage> {
        vec![
            RawMessage::new("Ana", "I'll send the deck tomorrow")
                .with_timestamp(Timestamp::parse("15.01.2024 10:30:45")),
            RawMessage::service("15 January 2024"),
            RawMessage::new("Luis", "thanks").with_timestamp(Timestamp::Raw("yesterday".into())),
        ]
    }

    #[test]
    fn test_format_messages_with_and_without_sender() {
        let text = format_messages(&msgs(), true);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "[2024-01-15T10:30] Ana: I'll send the deck tomorrow");
        assert_eq!(lines[1], "[] Unknown: 15 January 2024");
        assert_eq!(lines[2], "[yesterday] Luis: thanks");

        let text = format_messages(&msgs(), false);
        assert!(text.starts_with("[2024-01-15T10:30] I'll send"));
        assert!(!text.contains("Ana:"));
    }

    #[test]
    fn test_tasks_prompt_lists_vocabularies() {
        let prompt = tasks_prompt(&msgs());
        assert!(prompt.contains("pending|in_progress|completed"));
        assert!(prompt.contains("low|medium|high|urgent"));
        assert!(prompt.contains(&TaskCategory::vocabulary()));
        assert!(prompt.contains("Ana: I'll send"));
        assert!(prompt.ends_with(JSON_ONLY));
    }

    #[test]
    fn test_profile_prompt_elides_sender() {
        let prompt = profile_prompt("Ana", &msgs()[..1], false);
        assert!(prompt.contains("profile of Ana"));
        assert!(!prompt.contains("Ana: I'll"));
        assert!(prompt.contains(&PersonRole::vocabulary()));
        assert!(!prompt.contains("MAIN USER"));
    }

    #[test]
    fn test_main_user_note() {
        assert!(profile_prompt("Me", &[], true).contains("MAIN USER"));
        assert!(profile_with_commitments_prompt("Me", &[], true).contains("MAIN USER"));
    }

    #[test]
    fn test_commitments_and_alert_shapes() {
        assert!(profile_with_commitments_prompt("Ana", &[], false).contains("promise|agreement|deadline"));
        let alerts = behavior_alerts_prompt("Ana", &[]);
        assert!(alerts.contains(
            "inconsistency|knowledge_abuse|emotional_manipulation|possible_lies|red_flags"
        ));
        assert!(alerts.contains("{\"alerts\": []}"));
    }

    #[test]
    fn test_patterns_prompt_names_participants() {
        let prompt = patterns_prompt(&msgs(), &["Ana", "Luis"]);
        assert!(prompt.contains("Participants: Ana, Luis"));
        assert!(prompt.contains(&PatternType::vocabulary()));
    }
}
