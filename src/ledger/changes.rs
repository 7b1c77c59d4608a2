//! Drift detection between fingerprinted and current utterance content.
//!
//! Fingerprints are set by the explicit fingerprinting pass in
//! [`LedgerStore::save`](crate::ledger::LedgerStore::save), typically right
//! after the upstream stage that produced the data. Comparing them against a
//! fresh recompute tells downstream stages which records (or which tracked
//! fields) actually changed, so TTS re-synthesis and re-mixing run only
//! where necessary.

use crate::ledger::hashing;
use crate::ledger::record::Utterance;

/// Records whose content drifted since they were last fingerprinted.
///
/// Records without a stored fingerprint have no baseline and are never
/// reported.
pub fn modified_utterances(records: &[Utterance]) -> Vec<&Utterance> {
    records
        .iter()
        .filter(|record| match &record.fingerprint {
            Some(stored) => *stored != hashing::fingerprint(record),
            None => false,
        })
        .collect()
}

/// Names of tracked fields whose value drifted since last fingerprinted.
///
/// Only fields with a stored per-field fingerprint are checked; a field
/// that was never fingerprinted is never reported.
pub fn modified_fields(record: &Utterance) -> Vec<String> {
    record
        .field_fingerprints
        .iter()
        .filter(|(field, stored)| hashing::fingerprint_field(record, field).as_ref() != Some(stored))
        .map(|(field, _)| field.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::hashing::DEFAULT_TRACKED_FIELDS;
    use crate::ledger::store::compute_fingerprints;

    fn fingerprinted(start: f64, end: f64) -> Utterance {
        let mut record = Utterance::new(start, end);
        record.speaker_id = Some("SPEAKER_00".to_string());
        record.assigned_voice = Some("ca-ES-EnricNeural".to_string());
        let mut records = vec![record];
        compute_fingerprints(&mut records, DEFAULT_TRACKED_FIELDS);
        records.pop().unwrap()
    }

    #[test]
    fn test_unchanged_record_is_not_modified() {
        let records = vec![fingerprinted(1.26, 3.94)];
        assert!(modified_utterances(&records).is_empty());
    }

    #[test]
    fn test_timing_drift_is_detected() {
        let intact = fingerprinted(1.26, 3.94);
        let mut drifted = fingerprinted(5.24, 6.629);
        drifted.id = 2;
        drifted.end = 6.63;

        let records = vec![intact, drifted];
        let modified = modified_utterances(&records);
        assert_eq!(modified.len(), 1);
        assert_eq!(modified[0].id, 2);
    }

    #[test]
    fn test_record_without_baseline_is_ignored() {
        // A freshly created record has no fingerprint yet.
        let records = vec![Utterance::new(4.0, 5.0)];
        assert!(modified_utterances(&records).is_empty());
    }

    #[test]
    fn test_modified_fields_none() {
        let record = fingerprinted(5.24, 6.645);
        assert!(modified_fields(&record).is_empty());
    }

    #[test]
    fn test_modified_fields_reports_exactly_the_drifted_field() {
        let mut record = fingerprinted(5.24, 6.645);
        record.speaker_id = Some("SPEAKER_01".to_string());

        let fields = modified_fields(&record);
        assert_eq!(fields, vec!["speaker_id".to_string()]);
    }

    #[test]
    fn test_whole_record_drift_without_tracked_field_drift() {
        // A timing edit flips the record fingerprint but no tracked field.
        let mut record = fingerprinted(5.24, 6.645);
        record.end = 6.7;

        assert!(modified_fields(&record).is_empty());
        let records = vec![record];
        assert_eq!(modified_utterances(&records).len(), 1);
    }
}
