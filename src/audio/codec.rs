//! Codec boundary: decoding, export, and resampling.
//!
//! Decoding goes through symphonia (wav, mp3, flac, ogg, mp4 containers),
//! WAV export through hound, and lossy MP3 export is delegated to ffmpeg.
//! Dubba never implements codec math itself.

use crate::audio::buffer::AudioBuffer;
use crate::error::{DubbaError, Result};
use rubato::{FftFixedIn, Resampler};
use std::path::Path;
use std::process::{Command, Stdio};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decode an entire audio file to an in-memory PCM buffer.
pub fn decode(path: &Path) -> Result<AudioBuffer> {
    debug!("Decoding {}", path.display());

    let file = std::fs::File::open(path).map_err(|e| {
        DubbaError::AudioDecode(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| {
            DubbaError::AudioDecode(format!("Failed to probe {}: {}", path.display(), e))
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            DubbaError::AudioDecode(format!("No audio track in {}", path.display()))
        })?;
    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DubbaError::AudioDecode("Sample rate not found".to_string()))?;
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .ok_or_else(|| DubbaError::AudioDecode("Channel count not found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DubbaError::AudioDecode(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                warn!("Error reading packet from {}: {}", path.display(), e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_buf.is_none() {
                    let spec = *decoded.spec();
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = &mut sample_buf {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            Err(e) => {
                warn!("Decode error in {}: {}", path.display(), e);
                continue;
            }
        }
    }

    if samples.is_empty() {
        return Err(DubbaError::AudioDecode(format!(
            "No audio decoded from {}",
            path.display()
        )));
    }

    debug!(
        "Decoded {} frames at {} Hz, {} channel(s)",
        samples.len() / channels as usize,
        sample_rate,
        channels
    );
    Ok(AudioBuffer::from_samples(sample_rate, channels, samples))
}

/// Export a buffer to `path`.
///
/// `.wav` is written directly; `.mp3` is staged as WAV and encoded by
/// ffmpeg (the external codec boundary for lossy output).
pub fn export(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp3") => export_mp3(buffer, path),
        _ => write_wav(buffer, path),
    }
}

fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in buffer.samples() {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

fn export_mp3(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let staging = tempfile::Builder::new().suffix(".wav").tempfile()?;
    write_wav(buffer, staging.path())?;

    debug!("Encoding {} via ffmpeg", path.display());
    let result = Command::new("ffmpeg")
        .arg("-i").arg(staging.path())
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output();

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(DubbaError::AudioExport(format!(
                "ffmpeg encoding failed: {}",
                stderr
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DubbaError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(DubbaError::AudioExport(format!("ffmpeg error: {}", e))),
    }
}

/// Convert a buffer to `target_rate`, returning the input unchanged when
/// the rates already match.
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    if buffer.sample_rate() == target_rate {
        return Ok(buffer.clone());
    }
    debug!(
        "Resampling {} Hz -> {} Hz",
        buffer.sample_rate(),
        target_rate
    );

    let channels = buffer.channels() as usize;
    let chunk_frames = 1024;
    let mut resampler = FftFixedIn::<f32>::new(
        buffer.sample_rate() as usize,
        target_rate as usize,
        chunk_frames,
        2,
        channels,
    )
    .map_err(|e| DubbaError::Audio(format!("Failed to create resampler: {}", e)))?;

    // Deinterleave into per-channel planes.
    let frames = buffer.frames();
    let mut planes: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
    for (index, sample) in buffer.samples().iter().enumerate() {
        planes[index % channels].push(*sample);
    }

    let mut out_planes: Vec<Vec<f32>> = vec![Vec::new(); channels];
    let mut position = 0;
    while position + chunk_frames <= frames {
        let input: Vec<&[f32]> = planes
            .iter()
            .map(|plane| &plane[position..position + chunk_frames])
            .collect();
        let output = resampler
            .process(&input, None)
            .map_err(|e| DubbaError::Audio(format!("Resampling failed: {}", e)))?;
        for (channel, data) in output.into_iter().enumerate() {
            out_planes[channel].extend(data);
        }
        position += chunk_frames;
    }
    if position < frames {
        let input: Vec<&[f32]> = planes.iter().map(|plane| &plane[position..]).collect();
        let output = resampler
            .process_partial(Some(&input), None)
            .map_err(|e| DubbaError::Audio(format!("Resampling failed: {}", e)))?;
        for (channel, data) in output.into_iter().enumerate() {
            out_planes[channel].extend(data);
        }
    }

    // Interleave back.
    let out_frames = out_planes.first().map(|p| p.len()).unwrap_or(0);
    let mut samples = Vec::with_capacity(out_frames * channels);
    for frame in 0..out_frames {
        for plane in &out_planes {
            samples.push(plane[frame]);
        }
    }

    Ok(AudioBuffer::from_samples(target_rate, buffer.channels(), samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_export_decode_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let samples: Vec<f32> = (0..4410)
            .map(|i| (i as f32 * 0.05).sin() * 0.5)
            .collect();
        let original = AudioBuffer::from_samples(44_100, 1, samples);
        export(&original, &path).unwrap();

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.sample_rate(), 44_100);
        assert_eq!(decoded.channels(), 1);
        assert_eq!(decoded.frames(), original.frames());

        // 16-bit quantization bounds the error.
        for (a, b) in original.samples().iter().zip(decoded.samples()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_decode_missing_file_is_fatal() {
        let result = decode(Path::new("/nonexistent/audio.wav"));
        assert!(matches!(result, Err(DubbaError::AudioDecode(_))));
    }

    #[test]
    fn test_resample_halves_the_rate() {
        let clip = AudioBuffer::silent(1000, 44_100, 2);
        let resampled = resample(&clip, 22_050).unwrap();

        assert_eq!(resampled.sample_rate(), 22_050);
        assert_eq!(resampled.channels(), 2);
        // Chunked FFT resampling pads the tail; stay within tolerance.
        assert!(resampled.frames() >= 20_000 && resampled.frames() <= 25_000);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let clip = AudioBuffer::from_samples(44_100, 1, vec![0.1, 0.2, 0.3]);
        let resampled = resample(&clip, 44_100).unwrap();
        assert_eq!(resampled, clip);
    }
}
