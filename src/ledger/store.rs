//! Persistence for the utterance ledger.
//!
//! One structured JSON file per target language holds the ordered utterance
//! list plus pipeline metadata; preprocessing artifact paths are persisted
//! separately when the extraction stage provides them.

use crate::error::{DubbaError, Result};
use crate::ledger::hashing::{self, DEFAULT_TRACKED_FIELDS};
use crate::ledger::record::Utterance;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Free-form ledger metadata (source language, subtitle flags, ...).
pub type LedgerMetadata = BTreeMap<String, Value>;

/// Paths produced by the upstream extraction stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessingArtifacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_file: Option<PathBuf>,
    pub audio_file: PathBuf,
    pub audio_vocals_file: PathBuf,
    pub audio_background_file: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct LedgerFile {
    utterances: Vec<Utterance>,
    metadata: LedgerMetadata,
}

/// Stamp sequential ids 1..N in current order, overwriting any prior ids.
///
/// Idempotent given stable order: renumbering an already-numbered list
/// yields the same ids.
pub fn assign_ids(records: &mut [Utterance]) {
    for (index, record) in records.iter_mut().enumerate() {
        record.id = (index + 1) as u64;
    }
}

/// Fingerprint every record, plus every tracked field present on it.
pub fn compute_fingerprints(records: &mut [Utterance], tracked_fields: &[&str]) {
    for record in records.iter_mut() {
        record.fingerprint = Some(hashing::fingerprint(record));
        record.field_fingerprints = tracked_fields
            .iter()
            .filter_map(|field| {
                hashing::fingerprint_field(record, field).map(|digest| (field.to_string(), digest))
            })
            .collect();
    }
}

/// Remove records whose `text` is the empty string, preserving order.
///
/// Upstream stages emit these placeholders for spans where no speech was
/// recognized; records with no `text` at all are kept.
pub fn drop_empty(records: Vec<Utterance>) -> Vec<Utterance> {
    records
        .into_iter()
        .filter(|record| record.text.as_deref() != Some(""))
        .collect()
}

/// Load/save contract for one target language's ledger.
pub struct LedgerStore {
    target_language: String,
    output_directory: PathBuf,
    tracked_fields: Vec<String>,
}

impl LedgerStore {
    /// Create a store for `target_language` rooted at `output_directory`.
    pub fn new(target_language: impl Into<String>, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            target_language: target_language.into(),
            output_directory: output_directory.into(),
            tracked_fields: DEFAULT_TRACKED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }

    /// Override the set of independently tracked fields.
    pub fn with_tracked_fields(mut self, fields: Vec<String>) -> Self {
        self.tracked_fields = fields;
        self
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Path of the ledger file for this target language.
    pub fn ledger_path(&self) -> PathBuf {
        self.output_directory
            .join(format!("utterance_metadata_{}.json", self.target_language))
    }

    /// Path of the preprocessing artifacts file for this target language.
    pub fn artifacts_path(&self) -> PathBuf {
        self.output_directory
            .join(format!("preprocessing_{}.json", self.target_language))
    }

    /// Persist the ledger after an upstream stage: drops empty placeholders,
    /// fingerprints every record (this is the explicit fingerprinting pass
    /// that re-baselines drift detection), assigns dense ids, and writes.
    ///
    /// Returns the processed records as written.
    pub fn save(
        &self,
        metadata: &LedgerMetadata,
        records: Vec<Utterance>,
        preprocessing: Option<&PreprocessingArtifacts>,
    ) -> Result<Vec<Utterance>> {
        let tracked: Vec<&str> = self.tracked_fields.iter().map(String::as_str).collect();

        let mut records = drop_empty(records);
        compute_fingerprints(&mut records, &tracked);
        assign_ids(&mut records);

        self.write_ledger(metadata, &records)?;

        if let Some(artifacts) = preprocessing {
            let json = serde_json::to_string_pretty(artifacts)?;
            std::fs::write(self.artifacts_path(), json)?;
            debug!("Saved preprocessing artifacts to {:?}", self.artifacts_path());
        }

        info!(
            "Saved {} utterances for '{}'",
            records.len(),
            self.target_language
        );
        Ok(records)
    }

    /// Persist a reconciled ledger as-is.
    ///
    /// Ids are kept (new records already carry the next free id) and
    /// fingerprints are not recomputed, so a human edit neither masks a
    /// later upstream-drift check nor falsely re-baselines it.
    pub fn save_reconciled(
        &self,
        metadata: &LedgerMetadata,
        records: &[Utterance],
    ) -> Result<()> {
        self.write_ledger(metadata, records)?;
        info!(
            "Saved {} reconciled utterances for '{}'",
            records.len(),
            self.target_language
        );
        Ok(())
    }

    fn write_ledger(&self, metadata: &LedgerMetadata, records: &[Utterance]) -> Result<()> {
        std::fs::create_dir_all(&self.output_directory)?;
        let file = LedgerFile {
            utterances: records.to_vec(),
            metadata: metadata.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(self.ledger_path(), json)?;
        Ok(())
    }

    /// Load the ledger, preprocessing artifacts (if persisted), and metadata.
    ///
    /// An absent ledger file is a hard failure; there is no implicit empty
    /// ledger.
    pub fn load(&self) -> Result<(Vec<Utterance>, Option<PreprocessingArtifacts>, LedgerMetadata)> {
        let path = self.ledger_path();
        if !path.exists() {
            return Err(DubbaError::LedgerNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(&path)?;
        let file: LedgerFile = serde_json::from_str(&content)?;

        let artifacts = self.load_artifacts(&self.artifacts_path())?;

        debug!(
            "Loaded {} utterances for '{}'",
            file.utterances.len(),
            self.target_language
        );
        Ok((file.utterances, artifacts, file.metadata))
    }

    fn load_artifacts(&self, path: &Path) -> Result<Option<PreprocessingArtifacts>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}
