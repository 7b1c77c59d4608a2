//! Audio processing for Dubba.
//!
//! Covers the in-memory PCM buffer, the codec boundary (decode, export,
//! resample), per-utterance chunk extraction, and final timeline assembly.

mod assemble;
mod buffer;
mod codec;
mod extract;

pub use assemble::{
    compose_vocals, merge_background_and_vocals, needs_background_normalization,
    CompositionReport, MixSettings, OverlayFailure, VOCALS_FILE,
};
pub use buffer::AudioBuffer;
pub use codec::{decode, export, resample};
pub use extract::extract_chunks;
