//! Typed records produced by extraction.
//!
//! Every enum field has a closed vocabulary and a catch-all fallback arm.
//! Labels are matched case-insensitively and accept the Spanish spellings
//! older prompts produced, so `"técnico"` and `"technical"` both become
//! [`TaskCategory::Technical`]. Anything unrecognized maps to the fallback
//! instead of failing the whole record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Alerts below this self-reported confidence are discarded.
pub const ALERT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Confidence assumed when the model omits it.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Skill score assumed when the model omits it.
pub const DEFAULT_SKILL_SCORE: u8 = 50;

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident (fallback $fallback:ident) {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in prompt order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical label.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Strict label lookup (canonical labels and aliases).
            pub fn from_label(label: &str) -> Option<Self> {
                match label.trim().to_lowercase().as_str() {
                    $($label $(| $alias)* => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Label lookup that falls back instead of failing.
            pub fn parse_lenient(label: &str) -> Self {
                Self::from_label(label).unwrap_or($name::$fallback)
            }

            /// Labels joined with `|`, as shown to the model.
            pub fn vocabulary() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join("|")
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$fallback
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Self::from_label(s).ok_or_else(|| {
                    format!("Unknown label '{}'. Expected one of: {}", s, Self::vocabulary())
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let label = String::deserialize(deserializer)?;
                Ok(Self::parse_lenient(&label))
            }
        }
    };
}

vocabulary! {
    /// Task progress.
    TaskStatus (fallback Pending) {
        Pending => "pending" | "pendiente" | "todo",
        InProgress => "in_progress" | "in progress" | "in-progress" | "en_progreso" | "en progreso",
        Completed => "completed" | "done" | "completada" | "completado",
    }
}

vocabulary! {
    /// Task or alert urgency.
    Priority (fallback Medium) {
        Low => "low" | "baja",
        Medium => "medium" | "media",
        High => "high" | "alta",
        Urgent => "urgent" | "urgente",
    }
}

vocabulary! {
    /// Task area.
    TaskCategory (fallback General) {
        Mentoring => "mentoring" | "mentoría" | "mentoria",
        Technical => "technical" | "técnico" | "tecnico",
        Marketing => "marketing",
        Sales => "sales" | "ventas",
        Business => "business" | "negocio",
        Design => "design" | "diseño" | "diseno",
        Content => "content" | "contenido",
        Administrative => "administrative" | "administrativo",
        General => "general",
    }
}

vocabulary! {
    /// A participant's role in the conversation.
    PersonRole (fallback Unknown) {
        Collaborator => "collaborator" | "colaborador",
        Client => "client" | "cliente",
        Student => "student" | "alumno",
        Teacher => "teacher" | "profesor",
        Manager => "manager",
        Unknown => "unknown" | "desconocido",
    }
}

vocabulary! {
    /// Skill family.
    SkillCategory (fallback Other) {
        Technical => "technical" | "técnica" | "tecnica",
        Communication => "communication" | "comunicación" | "comunicacion",
        Leadership => "leadership" | "liderazgo",
        Organization => "organization" | "organización" | "organizacion",
        Creativity => "creativity" | "creatividad",
        Other => "other" | "otro",
    }
}

vocabulary! {
    /// Overall tone of a participant's messages.
    Sentiment (fallback Neutral) {
        Positive => "positive" | "positivo",
        Neutral => "neutral",
        Negative => "negative" | "negativo",
    }
}

vocabulary! {
    /// What kind of commitment was stated.
    CommitmentType (fallback Promise) {
        Promise => "promise" | "promesa",
        Agreement => "agreement" | "acuerdo",
        Deadline => "deadline" | "plazo" | "fecha_limite",
    }
}

vocabulary! {
    /// Flagged communication behavior.
    AlertType (fallback RedFlags) {
        Inconsistency => "inconsistency" | "inconsistencia",
        KnowledgeAbuse => "knowledge_abuse" | "abuso_conocimiento",
        EmotionalManipulation => "emotional_manipulation" | "manipulacion_emocional",
        PossibleLies => "possible_lies" | "posibles_mentiras",
        RedFlags => "red_flags" | "red_flag" | "banderas_rojas",
    }
}

vocabulary! {
    /// Alert severity.
    Severity (fallback Medium) {
        Low => "low" | "baja",
        Medium => "medium" | "media",
        High => "high" | "alta",
    }
}

vocabulary! {
    /// Communication pattern family.
    PatternType (fallback Other) {
        Communication => "communication" | "comunicación" | "comunicacion",
        Topics => "topics" | "temas",
        Dynamics => "dynamics" | "dinámicas" | "dinamicas",
        Flows => "flows" | "flujos",
        Problems => "problems" | "problemas",
        Opportunities => "opportunities" | "oportunidades",
        Other => "other" | "otro",
    }
}

/// Clamps a confidence into `[0, 1]`; NaN becomes the default.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        DEFAULT_CONFIDENCE
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Clamps a sentiment score into `[-1, 1]`; NaN becomes neutral.
pub fn clamp_sentiment_score(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) }
}

/// Rounds and clamps a skill score into `0..=100`.
pub fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        DEFAULT_SKILL_SCORE
    } else {
        value.round().clamp(0.0, 100.0) as u8
    }
}

/// An action item found in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub category: TaskCategory,
    /// Who should do it (not who mentioned it)
    pub assigned_to: Option<String>,
    pub source_message: String,
    pub due_date: Option<String>,
    pub confidence: f64,
}

/// A rated skill with supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub category: SkillCategory,
    /// 0 to 100
    pub score: u8,
    pub evidence: String,
}

/// A promise, agreement or deadline a participant stated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub title: String,
    #[serde(rename = "type")]
    pub commitment_type: CommitmentType,
    pub due_date: Option<String>,
    pub evidence: String,
}

/// What the model concluded about one participant.
///
/// The default value is the empty profile returned when extraction fails:
/// unknown role with zero confidence and no skills.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonProfile {
    pub role: PersonRole,
    pub role_confidence: f64,
    pub skills: Vec<Skill>,
    pub summary: String,
    pub strengths: Vec<String>,
    pub areas_to_improve: Vec<String>,
    pub recommendations: Vec<String>,
    pub sentiment: Sentiment,
    /// -1 (negative) to 1 (positive)
    pub sentiment_score: f64,
    pub commitments: Vec<Commitment>,
}

impl PersonProfile {
    /// Returns `true` if extraction produced nothing usable.
    pub fn is_empty(&self) -> bool {
        self.role == PersonRole::Unknown
            && self.skills.is_empty()
            && self.summary.is_empty()
            && self.commitments.is_empty()
    }
}

/// A flagged interpersonal behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorAlert {
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub evidence: String,
    pub message_examples: Vec<String>,
    pub recommendation: String,
    pub confidence: f64,
}

impl BehaviorAlert {
    /// Returns `true` if the alert clears [`ALERT_CONFIDENCE_THRESHOLD`].
    pub fn passes_gate(&self) -> bool {
        self.confidence >= ALERT_CONFIDENCE_THRESHOLD
    }
}

/// A recurring dynamic in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationPattern {
    pub name: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub description: String,
    pub persons_involved: Vec<String>,
    pub examples: Vec<String>,
    pub recommendations: String,
}
