//! Utterance ledger for Dubba.
//!
//! The ledger is the ordered, identity-stable collection of utterances for
//! one target language. This module covers the record model, content
//! fingerprinting, persistence, reconciliation of review edits, and drift
//! detection.

mod changes;
mod hashing;
mod reconcile;
mod record;
mod store;

pub use changes::{modified_fields, modified_utterances};
pub use hashing::{fingerprint, fingerprint_field, DEFAULT_TRACKED_FIELDS};
pub use reconcile::{apply_operations, EditAction, EditOperation, ReconcileReport};
pub use record::{Utterance, UtterancePatch, CONTENT_FIELDS};
pub use store::{
    assign_ids, compute_fingerprints, drop_empty, LedgerMetadata, LedgerStore,
    PreprocessingArtifacts,
};
