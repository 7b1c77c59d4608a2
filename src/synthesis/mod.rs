//! Text-to-speech collaborator seam.
//!
//! Synthesis backends run outside this crate; the contract is "translated
//! text plus voice id in, synthesized chunk path out". A backend failure
//! surfaces as a missing dubbed chunk, which assembly handles as a
//! per-utterance overlay failure.

use crate::error::Result;
use crate::ledger::Utterance;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Trait for speech synthesis services.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with the given voice into `output_path`.
    ///
    /// `speed` is a playback-rate multiplier (1.0 = natural pace).
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        speed: f64,
        output_path: &Path,
    ) -> Result<PathBuf>;
}

/// Canonical location of an utterance's synthesized chunk.
pub fn dubbed_chunk_path(output_dir: &Path, record: &Utterance) -> PathBuf {
    output_dir.join(format!("dubbed_chunk_{}_{}.wav", record.start, record.end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dubbed_chunk_path_is_span_keyed() {
        let record = Utterance::new(5.24534375, 6.629093750000001);
        let path = dubbed_chunk_path(Path::new("output"), &record);
        assert_eq!(
            path,
            PathBuf::from("output/dubbed_chunk_5.24534375_6.629093750000001.wav")
        );
    }
}
