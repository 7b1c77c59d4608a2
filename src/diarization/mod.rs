//! Speaker diarization collaborator seam.
//!
//! Diarization itself runs outside this crate; the contract is "audio asset
//! in, speaker-labelled time spans out". This module owns the loader-side
//! guards: rounding to millisecond precision, discarding zero/negative
//! timestamp artifacts from malformed inputs, and the `[SPEAKER_NN]:`
//! label convention used by prerecorded-transcript workflows.

use crate::error::Result;
use crate::ledger::Utterance;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// One speaker-labelled time span from diarization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSpan {
    pub start: f64,
    pub end: f64,
    pub speaker_id: String,
}

/// Trait for diarization services.
#[async_trait]
pub trait Diarizer: Send + Sync {
    /// Segment an audio file into speaker-labelled spans.
    async fn diarize(&self, audio_path: &Path) -> Result<Vec<SpeakerSpan>>;
}

/// Round spans to millisecond precision and drop zero/negative timestamps.
///
/// Malformed subtitle inputs occasionally produce spans anchored at or
/// before zero; those are artifacts, not speech.
pub fn sanitize_spans(spans: Vec<SpeakerSpan>) -> Vec<SpeakerSpan> {
    let near_zero = 0.00001;
    let before = spans.len();

    let sanitized: Vec<SpeakerSpan> = spans
        .into_iter()
        .filter(|span| span.start > near_zero && span.end > near_zero)
        .map(|span| SpeakerSpan {
            start: round_ms(span.start),
            end: round_ms(span.end),
            speaker_id: span.speaker_id,
        })
        .collect();

    if sanitized.len() != before {
        debug!("Discarded {} malformed spans", before - sanitized.len());
    }
    sanitized
}

fn round_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Parse the `[SPEAKER_NN]: text` labelling convention.
///
/// Returns the speaker id and the remaining text, or `None` when the line
/// does not carry a label.
pub fn parse_speaker_label(line: &str) -> Option<(String, String)> {
    static SPEAKER_LABEL: OnceLock<Regex> = OnceLock::new();
    let pattern = SPEAKER_LABEL
        .get_or_init(|| Regex::new(r"^\[(SPEAKER_\d+)\]:\s*(.*)$").expect("Invalid regex"));
    let captures = pattern.captures(line.trim())?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

/// Build initial ledger records from diarization spans.
///
/// Ids and fingerprints are left for the ledger's save pass.
pub fn spans_to_utterances(spans: &[SpeakerSpan]) -> Vec<Utterance> {
    spans
        .iter()
        .map(|span| {
            let mut record = Utterance::new(span.start, span.end);
            record.speaker_id = Some(span.speaker_id.clone());
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_drops_non_positive_spans() {
        let spans = vec![
            SpeakerSpan {
                start: 0.0,
                end: 1.5,
                speaker_id: "SPEAKER_00".into(),
            },
            SpeakerSpan {
                start: 1.5,
                end: -0.5,
                speaker_id: "SPEAKER_00".into(),
            },
            SpeakerSpan {
                start: 2.0,
                end: 3.0,
                speaker_id: "SPEAKER_01".into(),
            },
        ];

        let sanitized = sanitize_spans(spans);
        assert_eq!(sanitized.len(), 1);
        assert_eq!(sanitized[0].speaker_id, "SPEAKER_01");
    }

    #[test]
    fn test_sanitize_rounds_to_milliseconds() {
        let spans = vec![SpeakerSpan {
            start: 1.26284375,
            end: 3.94596875,
            speaker_id: "SPEAKER_00".into(),
        }];

        let sanitized = sanitize_spans(spans);
        assert_eq!(sanitized[0].start, 1.263);
        assert_eq!(sanitized[0].end, 3.946);
    }

    #[test]
    fn test_parse_speaker_label() {
        let parsed = parse_speaker_label("[SPEAKER_01]: Bon dia a tothom");
        assert_eq!(
            parsed,
            Some(("SPEAKER_01".to_string(), "Bon dia a tothom".to_string()))
        );

        assert_eq!(parse_speaker_label("Bon dia a tothom"), None);
        assert_eq!(parse_speaker_label("[NARRATOR]: hello"), None);
    }

    #[test]
    fn test_spans_to_utterances() {
        let spans = vec![SpeakerSpan {
            start: 1.263,
            end: 3.946,
            speaker_id: "SPEAKER_00".into(),
        }];

        let records = spans_to_utterances(&spans);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].start, 1.263);
        assert_eq!(records[0].speaker_id.as_deref(), Some("SPEAKER_00"));
        assert_eq!(records[0].id, 0);
        assert_eq!(records[0].fingerprint, None);
    }
}
