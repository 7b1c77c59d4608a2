//! Reconciliation of external review edits into a master ledger.
//!
//! A review tool hands back a batch of create/update/delete operations.
//! Applying the batch preserves the identity and untouched fields of every
//! record the batch does not name, and never recomputes fingerprints: a
//! human content edit must not mask or re-baseline upstream drift detection.

use crate::ledger::record::{Utterance, UtterancePatch};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Kind of edit carried by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    Create,
    Update,
    Delete,
}

/// One review edit.
///
/// For update/delete, `id` names the target record. For create, `id` names
/// the record to insert after; id 0 means "insert at the very front" (no
/// record ever has id 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOperation {
    pub id: u64,
    #[serde(rename = "operation")]
    pub action: EditAction,
    #[serde(flatten)]
    pub fields: UtterancePatch,
}

/// Per-batch outcome counts, so callers can see what a batch actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Operations that were dropped: malformed creates and edits naming an
    /// unknown id.
    pub skipped: usize,
}

/// Apply a batch of edit operations to the master ledger.
///
/// Operations are applied in batch order in a single pass. Unaffected record
/// ids never change; positions shift only as a consequence of delete/create.
/// Malformed creates and edits naming an unknown id are logged and counted,
/// never fatal.
pub fn apply_operations(
    master: &[Utterance],
    operations: &[EditOperation],
) -> (Vec<Utterance>, ReconcileReport) {
    let mut records: Vec<Utterance> = master.to_vec();
    let mut report = ReconcileReport::default();
    // Ids created by this batch, used to keep same-anchor creates in batch order.
    let mut batch_created: HashSet<u64> = HashSet::new();

    for operation in operations {
        match operation.action {
            EditAction::Delete => {
                if let Some(position) = records.iter().position(|r| r.id == operation.id) {
                    records.remove(position);
                    report.deleted += 1;
                } else {
                    warn!("Delete names unknown utterance id {}, skipping", operation.id);
                    report.skipped += 1;
                }
            }

            EditAction::Update => {
                if let Some(record) = records.iter_mut().find(|r| r.id == operation.id) {
                    operation.fields.apply_to(record);
                    report.updated += 1;
                } else {
                    warn!("Update names unknown utterance id {}, skipping", operation.id);
                    report.skipped += 1;
                }
            }

            EditAction::Create => {
                if operation.fields.translated_text.is_none()
                    || operation.fields.speaker_id.is_none()
                {
                    warn!(
                        "Create anchored at id {} is missing translated_text or speaker_id, skipping",
                        operation.id
                    );
                    report.skipped += 1;
                    continue;
                }

                let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
                let record = operation.fields.clone().into_utterance(next_id);

                let mut insert_at = if operation.id == 0 {
                    0
                } else if let Some(position) = records.iter().position(|r| r.id == operation.id) {
                    position + 1
                } else {
                    warn!(
                        "Create anchored at unknown id {}, appending at the end",
                        operation.id
                    );
                    records.len()
                };
                // Step past records created earlier in this batch at the same
                // anchor, so creates land in batch order.
                while insert_at < records.len() && batch_created.contains(&records[insert_at].id) {
                    insert_at += 1;
                }

                debug!("Created utterance id {} at position {}", next_id, insert_at);
                batch_created.insert(next_id);
                records.insert(insert_at, record);
                report.created += 1;
            }
        }
    }

    (records, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn master() -> Vec<Utterance> {
        let mut first = Utterance::new(1.26284375, 3.94596875);
        first.id = 1;
        first.speaker_id = Some("SPEAKER_00".to_string());
        first.path = Some(PathBuf::from("output/chunk_1.26284375_3.94596875.wav"));
        first.text = Some("Good morning, my name is Jordi Mas.".to_string());
        first.for_dubbing = Some(true);
        first.gender = Some("Male".to_string());
        first.translated_text = Some("Bon dia, el meu nom és Jordi Mas.".to_string());
        first.assigned_voice = Some("ca-ES-EnricNeural".to_string());
        first.speed = Some(1.0);
        first.dubbed_path = Some(PathBuf::from("output/dubbed_chunk_1.26284375_3.94596875.wav"));
        first.fingerprint =
            Some("b01b399ac50f80f87e704918e290ffc5ee0a1962683ba946c627124ea903480d".to_string());

        let mut second = first.clone();
        second.id = 2;
        second.start = 5.24534375;
        second.end = 6.629093750000001;
        second.text = Some("I am from Barcelona.".to_string());
        second.translated_text = Some("Sóc de Barcelona.".to_string());
        second.fingerprint =
            Some("629484afdecb7641e35d686d6348cee4445611690f2f77831e892d52c3128bdd".to_string());

        vec![first, second]
    }

    fn create_op(anchor: u64) -> EditOperation {
        EditOperation {
            id: anchor,
            action: EditAction::Create,
            fields: UtterancePatch {
                translated_text: Some("Bon dia".to_string()),
                speaker_id: Some("SPEAKER_01".to_string()),
                gender: Some("Male".to_string()),
                assigned_voice: Some("ca-ES-EnricNeural".to_string()),
                start: Some(4.0),
                end: Some(5.0),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_create_inserts_after_anchor() {
        let (merged, report) = apply_operations(&master(), &[create_op(1)]);

        assert_eq!(merged.len(), 3);
        let ids: Vec<u64> = merged.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_eq!(merged[1].translated_text.as_deref(), Some("Bon dia"));
        assert_eq!(merged[1].fingerprint, None);
        assert_eq!(report.created, 1);
    }

    #[test]
    fn test_create_at_front() {
        let (merged, _) = apply_operations(&master(), &[create_op(0)]);

        assert_eq!(merged.len(), 3);
        let ids: Vec<u64> = merged.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(merged[0].translated_text.as_deref(), Some("Bon dia"));
    }

    #[test]
    fn test_create_missing_required_fields_is_skipped() {
        let mut op = create_op(0);
        op.fields.translated_text = None;

        let (merged, report) = apply_operations(&master(), &[op]);
        assert_eq!(merged.len(), 2);
        let ids: Vec<u64> = merged.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 0);
    }

    #[test]
    fn test_creates_on_same_anchor_land_in_batch_order() {
        let mut second = create_op(1);
        second.fields.translated_text = Some("Bona tarda".to_string());

        let (merged, report) = apply_operations(&master(), &[create_op(1), second]);
        let ids: Vec<u64> = merged.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 3, 4, 2]);
        assert_eq!(merged[1].translated_text.as_deref(), Some("Bon dia"));
        assert_eq!(merged[2].translated_text.as_deref(), Some("Bona tarda"));
        assert_eq!(report.created, 2);
    }

    #[test]
    fn test_delete_removes_record_and_keeps_order() {
        let operations = vec![EditOperation {
            id: 1,
            action: EditAction::Delete,
            fields: UtterancePatch::default(),
        }];

        let (merged, report) = apply_operations(&master(), &operations);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, 2);
        assert_eq!(report.deleted, 1);
    }

    #[test]
    fn test_delete_unknown_id_is_a_reported_noop() {
        let operations = vec![EditOperation {
            id: 99,
            action: EditAction::Delete,
            fields: UtterancePatch::default(),
        }];

        let (merged, report) = apply_operations(&master(), &operations);
        assert_eq!(merged.len(), 2);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_update_overwrites_present_fields_only() {
        let operations = vec![EditOperation {
            id: 2,
            action: EditAction::Update,
            fields: UtterancePatch {
                gender: Some("Female".to_string()),
                translated_text: Some("Sóc de Tarragona".to_string()),
                ..Default::default()
            },
        }];

        let original = master();
        let (merged, report) = apply_operations(&original, &operations);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], original[0]);

        let mut expected = original[1].clone();
        expected.gender = Some("Female".to_string());
        expected.translated_text = Some("Sóc de Tarragona".to_string());
        assert_eq!(merged[1], expected);

        // The stored fingerprint survives the edit untouched.
        assert_eq!(merged[1].fingerprint, original[1].fingerprint);
        assert_eq!(report.updated, 1);
    }

    #[test]
    fn test_update_unknown_id_is_a_reported_noop() {
        let operations = vec![EditOperation {
            id: 42,
            action: EditAction::Update,
            fields: UtterancePatch {
                gender: Some("Female".to_string()),
                ..Default::default()
            },
        }];

        let original = master();
        let (merged, report) = apply_operations(&original, &operations);
        assert_eq!(merged, original);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_operation_batch_deserializes_from_review_json() {
        let json = r#"[
            {"id": 1, "operation": "create", "translated_text": "Bon dia",
             "speaker_id": "SPEAKER_01", "gender": "Male",
             "assigned_voice": "ca-ES-EnricNeural", "start": 4, "end": 5},
            {"id": 2, "operation": "delete"}
        ]"#;

        let operations: Vec<EditOperation> = serde_json::from_str(json).unwrap();
        assert_eq!(operations.len(), 2);
        assert_eq!(operations[0].action, EditAction::Create);
        assert_eq!(operations[0].fields.start, Some(4.0));
        assert_eq!(operations[1].action, EditAction::Delete);
    }
}
