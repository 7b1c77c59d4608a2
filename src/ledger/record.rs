//! Data models for the utterance ledger.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single utterance: one time-bounded speech segment with speaker, text,
/// translation, and synthesis metadata.
///
/// Content fields are what upstream stages compute and reviewers edit.
/// Bookkeeping (the record fingerprint, per-field fingerprints, and free-form
/// annotations) is kept in explicit typed fields and never participates in
/// fingerprinting or display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Utterance {
    /// Ledger-assigned identity, stable until the record is deleted.
    #[serde(default)]
    pub id: u64,

    /// Span start in the source timeline, seconds.
    pub start: f64,
    /// Span end in the source timeline, seconds.
    pub end: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Extracted source chunk location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Synthesized chunk location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dubbed_path: Option<PathBuf>,
    /// Whether this span should be voiced or left silent in the mix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_dubbing: Option<bool>,

    /// Content fingerprint set by the last explicit fingerprinting pass.
    #[serde(rename = "_hash", skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Per-field fingerprints for independently tracked fields.
    #[serde(
        rename = "_field_hashes",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub field_fingerprints: BTreeMap<String, String>,

    /// Private bookkeeping, excluded from fingerprints and display.
    #[serde(
        rename = "_annotations",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub annotations: BTreeMap<String, Value>,
}

/// Names of all content fields, in canonical (sorted) order.
pub const CONTENT_FIELDS: &[&str] = &[
    "assigned_voice",
    "dubbed_path",
    "end",
    "for_dubbing",
    "gender",
    "path",
    "speaker_id",
    "speed",
    "start",
    "text",
    "translated_text",
];

impl Utterance {
    /// Create a bare record spanning `start..end` seconds.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            ..Default::default()
        }
    }

    /// Span duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Look up a content field as a JSON value.
    ///
    /// Returns `None` for optional fields that are unset and for names that
    /// are not content fields (identity and bookkeeping are not content).
    pub fn content_field(&self, name: &str) -> Option<Value> {
        match name {
            "start" => Some(Value::from(self.start)),
            "end" => Some(Value::from(self.end)),
            "speaker_id" => self.speaker_id.as_deref().map(Value::from),
            "text" => self.text.as_deref().map(Value::from),
            "translated_text" => self.translated_text.as_deref().map(Value::from),
            "assigned_voice" => self.assigned_voice.as_deref().map(Value::from),
            "gender" => self.gender.as_deref().map(Value::from),
            "speed" => self.speed.map(Value::from),
            "path" => self.path.as_ref().map(|p| Value::from(p.to_string_lossy())),
            "dubbed_path" => self
                .dubbed_path
                .as_ref()
                .map(|p| Value::from(p.to_string_lossy())),
            "for_dubbing" => self.for_dubbing.map(Value::from),
            _ => None,
        }
    }

    /// All content fields present on this record, keyed by name.
    ///
    /// The map is ordered, so serializing it yields a canonical form.
    pub fn content_fields(&self) -> BTreeMap<&'static str, Value> {
        let mut fields = BTreeMap::new();
        for name in CONTENT_FIELDS {
            if let Some(value) = self.content_field(name) {
                fields.insert(*name, value);
            }
        }
        fields
    }
}

/// A partial utterance carried by a review edit operation.
///
/// Every field is optional: absent fields are left untouched on update and
/// unset on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtterancePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dubbed_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_dubbing: Option<bool>,
}

impl UtterancePatch {
    /// Overwrite exactly the fields present in the patch.
    ///
    /// Fingerprints are deliberately not touched: only an explicit
    /// fingerprinting pass updates drift-detection state.
    pub fn apply_to(&self, record: &mut Utterance) {
        if let Some(start) = self.start {
            record.start = start;
        }
        if let Some(end) = self.end {
            record.end = end;
        }
        if let Some(speaker_id) = &self.speaker_id {
            record.speaker_id = Some(speaker_id.clone());
        }
        if let Some(text) = &self.text {
            record.text = Some(text.clone());
        }
        if let Some(translated_text) = &self.translated_text {
            record.translated_text = Some(translated_text.clone());
        }
        if let Some(assigned_voice) = &self.assigned_voice {
            record.assigned_voice = Some(assigned_voice.clone());
        }
        if let Some(gender) = &self.gender {
            record.gender = Some(gender.clone());
        }
        if let Some(speed) = self.speed {
            record.speed = Some(speed);
        }
        if let Some(path) = &self.path {
            record.path = Some(path.clone());
        }
        if let Some(dubbed_path) = &self.dubbed_path {
            record.dubbed_path = Some(dubbed_path.clone());
        }
        if let Some(for_dubbing) = self.for_dubbing {
            record.for_dubbing = Some(for_dubbing);
        }
    }

    /// Build a fresh record with the given id from the patch fields.
    pub fn into_utterance(self, id: u64) -> Utterance {
        let mut record = Utterance::new(self.start.unwrap_or(0.0), self.end.unwrap_or(0.0));
        record.id = id;
        self.apply_to(&mut record);
        record
    }
}
