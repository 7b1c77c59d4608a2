//! Dubba - AI Dubbing Review and Assembly
//!
//! A local-first CLI tool for reviewing machine-generated dubbing segments
//! and assembling the final dubbed audio track.
//!
//! The name "Dubba" comes from the Swedish word for "to dub."
//!
//! # Overview
//!
//! Dubba allows you to:
//! - Persist and reload the utterance ledger for each target language
//! - Merge human review edits (create/update/delete) back into the ledger
//! - Detect which utterances or fields drifted since they were fingerprinted
//! - Cut source audio into per-utterance chunks
//! - Compose dubbed chunks onto a silent bed and mix them with the background
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `ledger` - Utterance records, persistence, reconciliation, change detection
//! - `audio` - PCM buffers, codec boundary, chunk extraction, timeline assembly
//! - `diarization` - Speaker segmentation collaborator seam
//! - `synthesis` - Text-to-speech collaborator seam
//! - `pipeline` - Stage coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use dubba::config::Settings;
//! use dubba::ledger::LedgerStore;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let store = LedgerStore::new("cat", settings.output_dir());
//!     let (utterances, _artifacts, _metadata) = store.load()?;
//!     println!("Loaded {} utterances", utterances.len());
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod diarization;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod synthesis;

pub use error::{DubbaError, Result};
