//! Assembly of the final dubbed track.
//!
//! Dubbed chunks are composited onto a silent bed exactly as long as the
//! background, then the bed is mixed with the background under adaptive
//! loudness normalization. Composition is best-effort: one bad chunk is
//! logged and recorded, never fatal for the whole track.

use crate::audio::codec;
use crate::audio::extract::seconds_to_ms;
use crate::error::{DubbaError, Result};
use crate::ledger::Utterance;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

/// File name of the composed vocals track.
pub const VOCALS_FILE: &str = "dubbed_vocals.wav";

/// Windowed peak probing resolution, in frames.
const PROBE_WINDOW_FRAMES: usize = 1024;

/// Gain and normalization knobs for the final mix.
#[derive(Debug, Clone, Copy)]
pub struct MixSettings {
    /// Gain offset applied to the vocals track, decibels.
    pub vocals_gain_db: f64,
    /// Gain offset applied to the background track, decibels.
    pub background_gain_db: f64,
    /// Background peak amplitude above which normalization kicks in.
    pub normalization_threshold: f32,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            vocals_gain_db: 5.0,
            background_gain_db: 0.0,
            normalization_threshold: 0.1,
        }
    }
}

/// One chunk that could not be placed on the bed.
#[derive(Debug, Clone)]
pub struct OverlayFailure {
    pub id: u64,
    pub path: Option<PathBuf>,
    pub start: f64,
    pub end: f64,
    pub reason: String,
}

/// Outcome of a composition pass, so callers can see how many chunks were
/// placed, deliberately skipped, or dropped.
#[derive(Debug, Clone, Default)]
pub struct CompositionReport {
    pub placed: usize,
    pub skipped: usize,
    pub failures: Vec<OverlayFailure>,
}

/// Composite dubbed chunks onto a silent bed at their absolute timestamps.
///
/// The bed is exactly as long as the background asset. Utterances with
/// `for_dubbing == false` keep their slot silent (the original background
/// passes through at mix time). Per-chunk failures are logged with path and
/// timestamps, recorded in the report, and do not abort the remaining
/// overlays. Failing to decode the background itself is fatal.
#[instrument(skip(records, background_file, output_dir), fields(count = records.len()))]
pub fn compose_vocals(
    records: &[Utterance],
    background_file: &Path,
    output_dir: &Path,
) -> Result<(PathBuf, CompositionReport)> {
    let background = codec::decode(background_file)?;
    let mut bed = crate::audio::AudioBuffer::silent(
        background.duration_ms(),
        background.sample_rate(),
        background.channels(),
    );

    let mut report = CompositionReport::default();
    for record in records {
        if record.for_dubbing != Some(true) {
            debug!(
                "Skipping utterance {} ({}s - {}s): not for dubbing",
                record.id, record.start, record.end
            );
            report.skipped += 1;
            continue;
        }

        match overlay_chunk(&mut bed, record) {
            Ok(()) => report.placed += 1,
            Err(e) => {
                error!(
                    "Failed to place chunk {:?} at {}s - {}s: {}",
                    record.dubbed_path, record.start, record.end, e
                );
                report.failures.push(OverlayFailure {
                    id: record.id,
                    path: record.dubbed_path.clone(),
                    start: record.start,
                    end: record.end,
                    reason: e.to_string(),
                });
            }
        }
    }

    std::fs::create_dir_all(output_dir)?;
    let vocals_path = output_dir.join(VOCALS_FILE);
    codec::export(&bed, &vocals_path)?;

    info!(
        "Composed vocals: {} placed, {} skipped, {} failed",
        report.placed,
        report.skipped,
        report.failures.len()
    );
    Ok((vocals_path, report))
}

fn overlay_chunk(bed: &mut crate::audio::AudioBuffer, record: &Utterance) -> Result<()> {
    let path = record
        .dubbed_path
        .as_ref()
        .ok_or_else(|| DubbaError::Audio("utterance has no dubbed chunk".to_string()))?;

    let chunk = codec::decode(path)?;
    let chunk = codec::resample(&chunk, bed.sample_rate())?;
    bed.overlay_at_ms(&chunk, seconds_to_ms(record.start))
}

/// Decide whether the background bed needs loudness normalization.
///
/// Samples fixed-size windows of the waveform and tracks the maximum
/// per-window peak; only a peak above `threshold` triggers normalization.
/// This avoids amplifying low-level residual vocal bleed left behind by an
/// imperfect source separation. A probe failure assumes the worst case and
/// forces normalization on.
pub fn needs_background_normalization(background_file: &Path, threshold: f32) -> (bool, f32) {
    match codec::decode(background_file) {
        Ok(background) => {
            let max_amplitude = background.max_window_peak(PROBE_WINDOW_FRAMES);
            let needs = max_amplitude > threshold;
            debug!(
                "Background normalization probe: max amplitude {:.3}, needs {}",
                max_amplitude, needs
            );
            (needs, max_amplitude)
        }
        Err(e) => {
            error!("Background normalization probe failed: {}", e);
            (true, 1.0)
        }
    }
}

/// Mix the background and vocals tracks and export the dubbed asset.
///
/// The background is normalized only when the probe says so; vocals are
/// always normalized. Both tracks get their configured gain offset, are
/// truncated to the shorter duration, and the vocals are overlaid on the
/// background base layer. The output is named by target language.
#[instrument(skip_all, fields(language = %target_language))]
pub fn merge_background_and_vocals(
    background_file: &Path,
    vocals_file: &Path,
    output_dir: &Path,
    target_language: &str,
    settings: MixSettings,
) -> Result<PathBuf> {
    let mut background = codec::decode(background_file)?;
    let mut vocals = codec::decode(vocals_file)?;

    // Normalizing an already-quiet background would raise residual vocals
    // not properly split out by source separation.
    let (needs, max_amplitude) =
        needs_background_normalization(background_file, settings.normalization_threshold);
    if needs {
        info!(
            "Normalizing background (max amplitude {:.2})",
            max_amplitude
        );
        background.normalize();
    }
    vocals.normalize();

    background.gain_db(settings.background_gain_db);
    vocals.gain_db(settings.vocals_gain_db);

    let vocals = codec::resample(&vocals, background.sample_rate())?;
    let mut vocals = vocals;

    let shortest = background.duration_ms().min(vocals.duration_ms());
    background.truncate_ms(shortest);
    vocals.truncate_ms(shortest);

    background.overlay_at_ms(&vocals, 0)?;

    let suffix = target_language.replace('-', "_").to_lowercase();
    let output_path = output_dir.join(format!("dubbed_audio_{}.mp3", suffix));
    codec::export(&background, &output_path)?;

    info!("Exported dubbed audio to {}", output_path.display());
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioBuffer;

    fn constant_clip(duration_ms: u64, amplitude: f32) -> AudioBuffer {
        let frames = (duration_ms * 44_100 / 1000) as usize;
        AudioBuffer::from_samples(44_100, 1, vec![amplitude; frames])
    }

    fn write_clip(path: &Path, duration_ms: u64, amplitude: f32) {
        codec::export(&constant_clip(duration_ms, amplitude), path).unwrap();
    }

    fn ffmpeg_available() -> bool {
        std::process::Command::new("ffmpeg")
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_compose_places_skips_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let background = dir.path().join("no_vocals.wav");
        write_clip(&background, 2000, 0.05);
        let chunk = dir.path().join("dubbed_chunk.wav");
        write_clip(&chunk, 300, 0.25);

        let mut voiced = Utterance::new(0.5, 0.8);
        voiced.id = 1;
        voiced.for_dubbing = Some(true);
        voiced.dubbed_path = Some(chunk);

        let mut passthrough = Utterance::new(1.0, 1.2);
        passthrough.id = 2;
        passthrough.for_dubbing = Some(false);

        let mut broken = Utterance::new(1.5, 1.7);
        broken.id = 3;
        broken.for_dubbing = Some(true);
        broken.dubbed_path = Some(dir.path().join("missing.wav"));

        let (vocals_path, report) =
            compose_vocals(&[voiced, passthrough, broken], &background, dir.path()).unwrap();

        assert!(vocals_path.exists());
        assert_eq!(report.placed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, 3);

        let vocals = codec::decode(&vocals_path).unwrap();
        assert_eq!(vocals.duration_ms(), 2000);

        // Chunk audible at 0.6s, silence before the placement point.
        let at = |seconds: f64| vocals.samples()[(seconds * 44_100.0) as usize];
        assert!((at(0.6) - 0.25).abs() < 1e-2);
        assert!(at(0.1).abs() < 1e-3);
        assert!(at(1.1).abs() < 1e-3);
    }

    #[test]
    fn test_quiet_background_skips_normalization() {
        let dir = tempfile::tempdir().unwrap();
        let background = dir.path().join("quiet.wav");
        write_clip(&background, 500, 0.05);

        let (needs, peak) = needs_background_normalization(&background, 0.1);
        assert!(!needs);
        assert!((peak - 0.05).abs() < 1e-2);
    }

    #[test]
    fn test_loud_background_needs_normalization() {
        let dir = tempfile::tempdir().unwrap();
        let background = dir.path().join("loud.wav");
        write_clip(&background, 500, 0.5);

        let (needs, peak) = needs_background_normalization(&background, 0.1);
        assert!(needs);
        assert!(peak > 0.4);
    }

    #[test]
    fn test_unreadable_background_forces_normalization() {
        let (needs, peak) =
            needs_background_normalization(Path::new("/nonexistent/no_vocals.wav"), 0.1);
        assert!(needs);
        assert_eq!(peak, 1.0);
    }

    #[test]
    fn test_merge_exports_language_named_asset() {
        if !ffmpeg_available() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let background = dir.path().join("no_vocals.wav");
        write_clip(&background, 1000, 0.05);
        let vocals = dir.path().join(VOCALS_FILE);
        write_clip(&vocals, 1200, 0.3);

        let output = merge_background_and_vocals(
            &background,
            &vocals,
            dir.path(),
            "ca-ES",
            MixSettings::default(),
        )
        .unwrap();

        assert!(output.ends_with("dubbed_audio_ca_es.mp3"));
        assert!(output.exists());
    }
}
