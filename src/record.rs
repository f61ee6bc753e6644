//! Persisted review records and the feedback they carry.
//!
//! A [`ResumeRecord`] is stored as a JSON string under `resume:<id>` in the
//! user's key-value namespace. It is written twice: once with empty feedback
//! right after the blobs are uploaded, and again once the critique is parsed.
//! Empty feedback is persisted as `""`, which readers treat as "still
//! processing".

use crate::error::StoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Prefix shared by every record key.
pub const RECORD_KEY_PREFIX: &str = "resume:";

/// Key under which the record with `id` is stored.
pub fn record_key(id: &Uuid) -> String {
    format!("{RECORD_KEY_PREFIX}{id}")
}

/// One resume submission and its critique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub resume_path: String,
    pub image_path: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(with = "feedback_slot", default)]
    pub feedback: Option<Feedback>,
}

impl ResumeRecord {
    pub fn key(&self) -> String {
        record_key(&self.id)
    }

    pub fn has_feedback(&self) -> bool {
        self.feedback.is_some()
    }

    /// Serialise to the persisted string form.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the persisted string form.
    pub fn from_json(s: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// `Option<Feedback>` persisted as `""` when empty.
mod feedback_slot {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Option<Feedback>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(feedback) => feedback.as_value().serialize(s),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Feedback>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            // Some writers store the critique text itself rather than the object.
            Value::String(s) => match serde_json::from_str::<Value>(&s) {
                Ok(inner) => Some(Feedback::from_value(inner)),
                Err(_) => Some(Feedback::from_value(Value::String(s))),
            },
            other => Some(Feedback::from_value(other)),
        })
    }
}

/// Critique returned by the model, kept exactly as it was parsed.
///
/// Nothing about its shape is enforced. The accessors read the known
/// sections leniently: a missing or non-numeric score reads as 0 and
/// missing tips read as none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feedback(Value);

impl Default for Feedback {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl From<Value> for Feedback {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

const NARRATIVE_SECTIONS: [(&str, &str); 4] = [
    ("toneAndStyle", "Tone & Style"),
    ("content", "Content"),
    ("structure", "Structure"),
    ("skills", "Skills"),
];

impl Feedback {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn overall_score(&self) -> Option<f64> {
        self.0.get("overallScore").and_then(score_of)
    }

    /// The `ATS` section, or score 0 with no tips.
    pub fn ats(&self) -> Section {
        self.section("ATS").unwrap_or_default()
    }

    /// Section stored under `key`, if any.
    pub fn section(&self, key: &str) -> Option<Section> {
        self.0
            .get(key)
            .filter(|v| !v.is_null())
            .map(Section::from_value)
    }

    /// Narrative sections in display order, skipping absent ones.
    pub fn sections(&self) -> Vec<(&'static str, Section)> {
        NARRATIVE_SECTIONS
            .iter()
            .filter_map(|(key, name)| self.section(key).map(|s| (*name, s)))
            .collect()
    }
}

/// Numbers as-is, numeric strings such as `"75"` or `"75%"` parsed.
fn score_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim_end().parse().ok(),
        _ => None,
    }
}

/// A scored section with improvement tips.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Section {
    pub score: f64,
    pub tips: Vec<Tip>,
}

impl Section {
    fn from_value(value: &Value) -> Self {
        Self {
            score: value.get("score").and_then(score_of).unwrap_or(0.0),
            tips: value
                .get("tips")
                .and_then(Value::as_array)
                .map(|tips| tips.iter().filter_map(Tip::from_value).collect())
                .unwrap_or_default(),
        }
    }
}

/// A tip is either bare text or the detailed `{type, tip, explanation}` form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Tip {
    Text(String),
    Detailed {
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<TipKind>,
        tip: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
}

impl Tip {
    /// Read one entry of a `tips` array. Objects without a `tip` key fall
    /// back to `title`, then `text`, then their own JSON.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Tip::Text(s.clone())),
            Value::Object(map) => {
                let text = ["tip", "title", "text"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str));
                Some(Tip::Detailed {
                    kind: map.get("type").and_then(Value::as_str).and_then(TipKind::parse),
                    tip: text.map_or_else(|| value.to_string(), str::to_string),
                    explanation: map
                        .get("explanation")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            }
            other => Some(Tip::Text(other.to_string())),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Tip::Text(s) => s,
            Tip::Detailed { tip, .. } => tip,
        }
    }

    pub fn kind(&self) -> Option<TipKind> {
        match self {
            Tip::Text(_) => None,
            Tip::Detailed { kind, .. } => *kind,
        }
    }

    pub fn explanation(&self) -> Option<&str> {
        match self {
            Tip::Text(_) => None,
            Tip::Detailed { explanation, .. } => explanation.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

impl TipKind {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Some(TipKind::Good),
            "improve" => Some(TipKind::Improve),
            _ => None,
        }
    }
}
