//! Content fingerprints for utterance records.
//!
//! A fingerprint is a SHA-256 digest over the canonical serialization of a
//! record's content fields (present fields only, keys sorted). Identity and
//! bookkeeping fields never enter the digest, so a record fingerprinted
//! before and after id assignment hashes the same.

use crate::ledger::record::Utterance;
use sha2::{Digest, Sha256};

/// Fields tracked with an independent per-field fingerprint by default.
///
/// These are the attributes whose drift requires re-running TTS for the
/// record, without reprocessing anything else.
pub const DEFAULT_TRACKED_FIELDS: &[&str] = &["assigned_voice", "speaker_id"];

/// Compute the content fingerprint of a record.
///
/// Deterministic: two records with identical content fields always yield
/// the same digest, regardless of id, annotations, or stored fingerprints.
pub fn fingerprint(record: &Utterance) -> String {
    let canonical = serde_json::to_vec(&record.content_fields()).unwrap_or_default();
    sha256_hex(&canonical)
}

/// Compute the fingerprint of a single content field.
///
/// Returns `None` when the field is absent from the record.
pub fn fingerprint_field(record: &Utterance, field: &str) -> Option<String> {
    let value = record.content_field(field)?;
    let canonical = serde_json::to_vec(&value).unwrap_or_default();
    Some(sha256_hex(&canonical))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample() -> Utterance {
        let mut record = Utterance::new(1.26, 3.94);
        record.speaker_id = Some("SPEAKER_00".to_string());
        record
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(fingerprint(&sample()), fingerprint(&sample()));
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let mut changed = sample();
        changed.end = 3.95;
        assert_ne!(fingerprint(&sample()), fingerprint(&changed));
    }

    #[test]
    fn test_fingerprint_ignores_bookkeeping() {
        let baseline = fingerprint(&sample());

        let mut record = sample();
        record.id = 42;
        record.fingerprint = Some("stale".to_string());
        record
            .field_fingerprints
            .insert("speaker_id".into(), "stale".into());
        record.annotations.insert("reviewed".into(), Value::from(true));

        assert_eq!(fingerprint(&record), baseline);
    }

    #[test]
    fn test_fingerprint_field_absent() {
        assert_eq!(fingerprint_field(&sample(), "assigned_voice"), None);
    }

    #[test]
    fn test_fingerprint_field_tracks_one_value() {
        let mut record = sample();
        record.assigned_voice = Some("ca-ES-EnricNeural".to_string());

        let voice = fingerprint_field(&record, "assigned_voice").unwrap();
        let speaker = fingerprint_field(&record, "speaker_id").unwrap();
        assert_ne!(voice, speaker);

        // Changing an unrelated field leaves the per-field digest alone.
        record.end = 9.99;
        assert_eq!(fingerprint_field(&record, "assigned_voice").unwrap(), voice);
    }
}
