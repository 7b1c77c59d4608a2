//! Cutting source audio into per-utterance chunk files.

use crate::audio::{buffer::AudioBuffer, codec};
use crate::error::Result;
use crate::ledger::Utterance;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Convert a timestamp in seconds to whole milliseconds, truncating toward
/// zero.
pub(crate) fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds * 1000.0) as u64
}

/// Slice `source_audio` into one chunk file per utterance and stamp each
/// record's `path`.
///
/// The source asset is decoded once; failure to decode it is fatal for the
/// whole operation. Each chunk covers the half-open interval
/// `[start, end)` at millisecond precision.
#[instrument(skip(records, source_audio, output_dir), fields(count = records.len()))]
pub fn extract_chunks(
    records: &[Utterance],
    source_audio: &Path,
    output_dir: &Path,
) -> Result<Vec<Utterance>> {
    std::fs::create_dir_all(output_dir)?;

    let audio = codec::decode(source_audio)?;

    let mut updated = Vec::with_capacity(records.len());
    for record in records {
        let chunk_path = cut_and_save(&audio, record, output_dir)?;
        debug!("Wrote chunk {}", chunk_path.display());

        let mut record = record.clone();
        record.path = Some(chunk_path);
        updated.push(record);
    }

    info!(
        "Extracted {} chunks from {}",
        updated.len(),
        source_audio.display()
    );
    Ok(updated)
}

fn cut_and_save(
    audio: &AudioBuffer,
    record: &Utterance,
    output_dir: &Path,
) -> Result<std::path::PathBuf> {
    let start_ms = seconds_to_ms(record.start);
    let end_ms = seconds_to_ms(record.end);
    let chunk = audio.slice_ms(start_ms, end_ms);

    let chunk_path = output_dir.join(format!("chunk_{}_{}.wav", record.start, record.end));
    codec::export(&chunk, &chunk_path)?;
    Ok(chunk_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DubbaError;

    fn constant_clip(duration_ms: u64, amplitude: f32) -> AudioBuffer {
        let frames = (duration_ms * 44_100 / 1000) as usize;
        AudioBuffer::from_samples(44_100, 1, vec![amplitude; frames])
    }

    #[test]
    fn test_seconds_to_ms_truncates_toward_zero() {
        assert_eq!(seconds_to_ms(1.26284375), 1262);
        assert_eq!(seconds_to_ms(6.629093750000001), 6629);
        assert_eq!(seconds_to_ms(0.0), 0);
    }

    #[test]
    fn test_extract_stamps_paths_and_writes_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.wav");
        codec::export(&constant_clip(3000, 0.25), &source).unwrap();

        let records = vec![Utterance::new(0.5, 1.0), Utterance::new(1.25, 2.75)];
        let updated = extract_chunks(&records, &source, dir.path()).unwrap();

        assert_eq!(updated.len(), 2);
        for (record, original) in updated.iter().zip(&records) {
            let path = record.path.as_ref().expect("path stamped");
            assert!(path.exists());
            assert_eq!(record.start, original.start);
            assert_eq!(record.end, original.end);
        }

        let first = codec::decode(updated[0].path.as_ref().unwrap()).unwrap();
        assert_eq!(first.duration_ms(), 500);
        let second = codec::decode(updated[1].path.as_ref().unwrap()).unwrap();
        assert_eq!(second.duration_ms(), 1500);
    }

    #[test]
    fn test_undecodable_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("bogus.wav");
        std::fs::write(&source, b"not audio at all").unwrap();

        let records = vec![Utterance::new(0.0, 1.0)];
        let result = extract_chunks(&records, &source, dir.path());
        assert!(matches!(result, Err(DubbaError::AudioDecode(_))));
    }
}
