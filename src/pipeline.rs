//! Pipeline driver for Dubba.
//!
//! Coordinates the ledger and the audio stages around one target language:
//! ingesting diarization spans, reconciling review edits, re-synthesizing
//! drifted utterances, and assembling the final dubbed track.

use crate::audio::{self, MixSettings};
use crate::config::Settings;
use crate::diarization::{parse_speaker_label, sanitize_spans, spans_to_utterances, SpeakerSpan};
use crate::error::{DubbaError, Result};
use crate::ledger::{
    apply_operations, compute_fingerprints, modified_fields, modified_utterances, EditOperation,
    LedgerMetadata, LedgerStore, PreprocessingArtifacts, ReconcileReport, Utterance,
};
use crate::synthesis::{dubbed_chunk_path, SpeechSynthesizer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main driver for the Dubba pipeline.
pub struct Pipeline {
    settings: Settings,
    store: LedgerStore,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl Pipeline {
    /// Create a pipeline for the configured target language.
    pub fn new(settings: Settings) -> Result<Self> {
        let output_dir = settings.output_dir();
        std::fs::create_dir_all(&output_dir)?;

        let store = LedgerStore::new(&settings.dubbing.target_language, &output_dir)
            .with_tracked_fields(settings.dubbing.tracked_fields.clone());

        Ok(Self {
            settings,
            store,
            synthesizer: None,
        })
    }

    /// Attach a synthesis backend for re-dubbing drifted utterances.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the ledger store.
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Seed the ledger from diarization spans.
    ///
    /// Spans are sanitized, turned into records, and persisted through the
    /// full save pass (placeholder drop, fingerprints, dense ids).
    #[instrument(skip_all, fields(spans = spans.len()))]
    pub fn ingest_spans(
        &self,
        spans: Vec<SpeakerSpan>,
        metadata: &LedgerMetadata,
        preprocessing: Option<&PreprocessingArtifacts>,
    ) -> Result<Vec<Utterance>> {
        let spans = sanitize_spans(spans);
        let records = spans_to_utterances(&spans);
        self.store.save(metadata, records, preprocessing)
    }

    /// Merge a prerecorded transcript into the ledger, one line per
    /// utterance in ledger order.
    ///
    /// A `[SPEAKER_NN]:` label on a line overrides the record's speaker;
    /// unlabelled lines set text only. This is an upstream stage, so the
    /// merged ledger goes through the full save pass: blank lines drop
    /// their records and the result is the new drift baseline.
    #[instrument(skip_all, fields(lines = lines.len()))]
    pub fn apply_transcript(&self, lines: &[String]) -> Result<Vec<Utterance>> {
        let (mut records, artifacts, metadata) = self.store.load()?;
        if lines.len() != records.len() {
            warn!(
                "Transcript has {} lines for {} utterances; unmatched entries are ignored",
                lines.len(),
                records.len()
            );
        }

        for (record, line) in records.iter_mut().zip(lines) {
            match parse_speaker_label(line) {
                Some((speaker, text)) => {
                    record.speaker_id = Some(speaker);
                    record.text = Some(text);
                }
                None => record.text = Some(line.trim().to_string()),
            }
        }

        self.store.save(&metadata, records, artifacts.as_ref())
    }

    /// Apply a batch of review edits to the stored ledger.
    ///
    /// The reconciled ledger is persisted as-is: ids and fingerprints are
    /// untouched, so drift detection still works after a review pass.
    #[instrument(skip_all, fields(operations = operations.len()))]
    pub fn apply_review(&self, operations: &[EditOperation]) -> Result<ReconcileReport> {
        let (records, _, metadata) = self.store.load()?;
        let (reconciled, report) = apply_operations(&records, operations);
        self.store.save_reconciled(&metadata, &reconciled)?;

        info!(
            "Applied review batch: {} created, {} updated, {} deleted, {} skipped",
            report.created, report.updated, report.deleted, report.skipped
        );
        Ok(report)
    }

    /// Report utterances whose content has drifted since the last
    /// fingerprinting pass, with the fields that changed.
    pub fn drift_report(&self) -> Result<Vec<(u64, Vec<String>)>> {
        let (records, _, _) = self.store.load()?;
        Ok(modified_utterances(&records)
            .into_iter()
            .map(|record| (record.id, modified_fields(record)))
            .collect())
    }

    /// Re-synthesize every drifted utterance and re-baseline its fingerprints.
    ///
    /// Drifted records missing a translation or voice are logged and left
    /// alone; their drift will show up again on the next pass. Returns the
    /// number of utterances re-synthesized.
    #[instrument(skip(self))]
    pub async fn resynthesize_drifted(&self) -> Result<usize> {
        let synthesizer = self.synthesizer.as_ref().ok_or_else(|| {
            DubbaError::Synthesis("no synthesis backend configured".to_string())
        })?;

        let (mut records, _, metadata) = self.store.load()?;
        let output_dir = self.settings.output_dir();
        let tracked: Vec<&str> = self
            .settings
            .dubbing
            .tracked_fields
            .iter()
            .map(String::as_str)
            .collect();

        let drifted: Vec<u64> = modified_utterances(&records)
            .into_iter()
            .map(|record| record.id)
            .collect();

        let mut resynthesized = 0;
        for record in records
            .iter_mut()
            .filter(|record| drifted.contains(&record.id))
        {
            let (text, voice) = match (&record.translated_text, &record.assigned_voice) {
                (Some(text), Some(voice)) => (text.clone(), voice.clone()),
                _ => {
                    warn!(
                        "Utterance {} drifted but has no translated_text or assigned_voice, skipping",
                        record.id
                    );
                    continue;
                }
            };

            let chunk_path = dubbed_chunk_path(&output_dir, record);
            info!(
                "Re-synthesizing utterance {} ({}s - {}s)",
                record.id, record.start, record.end
            );
            let written = synthesizer
                .synthesize(&text, &voice, record.speed.unwrap_or(1.0), &chunk_path)
                .await?;

            record.dubbed_path = Some(written);
            // The chunk now matches the content again; re-baseline so the
            // next drift check starts from here.
            compute_fingerprints(std::slice::from_mut(record), &tracked);
            resynthesized += 1;
        }

        if resynthesized > 0 {
            self.store.save_reconciled(&metadata, &records)?;
        }
        info!("Re-synthesized {} utterances", resynthesized);
        Ok(resynthesized)
    }

    /// Cut per-utterance chunks from `source_audio` and stamp their paths.
    ///
    /// Stamped paths are content, so the records are re-fingerprinted: a
    /// machine extract pass is a new baseline, not drift.
    #[instrument(skip(self, source_audio))]
    pub fn extract(&self, source_audio: &Path) -> Result<usize> {
        let (records, _, metadata) = self.store.load()?;
        let mut stamped =
            audio::extract_chunks(&records, source_audio, &self.settings.output_dir())?;

        let tracked: Vec<&str> = self
            .settings
            .dubbing
            .tracked_fields
            .iter()
            .map(String::as_str)
            .collect();
        compute_fingerprints(&mut stamped, &tracked);

        let count = stamped.len();
        self.store.save_reconciled(&metadata, &stamped)?;
        Ok(count)
    }

    /// Assemble the dubbed track: compose vocals onto a silent bed, then mix
    /// with the background and export.
    ///
    /// Requires the preprocessing artifacts persisted by the ingest stage;
    /// the background asset is the mix's base layer.
    #[instrument(skip(self))]
    pub fn assemble(&self) -> Result<PathBuf> {
        let (records, artifacts, _) = self.store.load()?;
        let artifacts = artifacts.ok_or_else(|| {
            DubbaError::InvalidInput(
                "no preprocessing artifacts recorded; ingest with a background track first"
                    .to_string(),
            )
        })?;

        let output_dir = self.settings.output_dir();
        let (vocals_path, report) =
            audio::compose_vocals(&records, &artifacts.audio_background_file, &output_dir)?;
        if !report.failures.is_empty() {
            warn!(
                "{} chunks failed to place; their slots stay silent",
                report.failures.len()
            );
        }

        self.mix(&artifacts.audio_background_file, &vocals_path, &output_dir)
    }

    fn mix(&self, background: &Path, vocals: &Path, output_dir: &Path) -> Result<PathBuf> {
        let mix: MixSettings = self.settings.mix_settings();
        audio::merge_background_and_vocals(
            background,
            vocals,
            output_dir,
            self.store.target_language(),
            mix,
        )
    }
}
