//! In-memory PCM audio buffer.
//!
//! Interleaved f32 samples in [-1.0, 1.0], mono or stereo, at the sample
//! rate the source was decoded at. All timeline arithmetic is done in
//! milliseconds with truncation toward zero.

use crate::error::{DubbaError, Result};

/// An in-memory audio clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl AudioBuffer {
    /// Wrap interleaved samples.
    pub fn from_samples(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// A silent clip of exactly `duration_ms` milliseconds.
    pub fn silent(duration_ms: u64, sample_rate: u32, channels: u16) -> Self {
        let frames = Self::ms_to_frames(duration_ms, sample_rate);
        Self {
            sample_rate,
            channels,
            samples: vec![0.0; frames * channels as usize],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Clip length in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.frames() as u64 * 1000) / self.sample_rate as u64
    }

    fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
        ((ms * sample_rate as u64) / 1000) as usize
    }

    /// Extract the half-open interval `[start_ms, end_ms)`, clamped to the
    /// clip bounds.
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioBuffer {
        let stride = self.channels as usize;
        let start = Self::ms_to_frames(start_ms, self.sample_rate).min(self.frames());
        let end = Self::ms_to_frames(end_ms, self.sample_rate)
            .min(self.frames())
            .max(start);

        AudioBuffer {
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples: self.samples[start * stride..end * stride].to_vec(),
        }
    }

    /// Mix `other` additively into this clip starting at `position_ms`.
    ///
    /// Anything extending past the end of this clip is dropped, and the sum
    /// is clamped to [-1.0, 1.0]. Both clips must share a sample rate; the
    /// caller resamples first when they do not.
    pub fn overlay_at_ms(&mut self, other: &AudioBuffer, position_ms: u64) -> Result<()> {
        if other.sample_rate != self.sample_rate {
            return Err(DubbaError::Audio(format!(
                "Sample rate mismatch in overlay: {} vs {}",
                other.sample_rate, self.sample_rate
            )));
        }

        let base_channels = self.channels as usize;
        let start_frame = Self::ms_to_frames(position_ms, self.sample_rate);
        let frames = other.frames().min(self.frames().saturating_sub(start_frame));

        for frame in 0..frames {
            for channel in 0..base_channels {
                let added = other.frame_sample(frame, channel, base_channels);
                let index = (start_frame + frame) * base_channels + channel;
                self.samples[index] = (self.samples[index] + added).clamp(-1.0, 1.0);
            }
        }
        Ok(())
    }

    /// Sample for `channel` within `frame`, down- or up-mixing when the
    /// channel counts differ (stereo to mono averages, mono to stereo
    /// duplicates).
    fn frame_sample(&self, frame: usize, channel: usize, target_channels: usize) -> f32 {
        let stride = self.channels as usize;
        let base = frame * stride;
        if stride > target_channels {
            self.samples[base..base + stride].iter().sum::<f32>() / stride as f32
        } else {
            self.samples[base + channel.min(stride - 1)]
        }
    }

    /// Apply a gain offset in decibels.
    pub fn gain_db(&mut self, db: f64) {
        let factor = 10f64.powf(db / 20.0) as f32;
        for sample in &mut self.samples {
            *sample = (*sample * factor).clamp(-1.0, 1.0);
        }
    }

    /// Peak-normalize to just under full scale (0.1 dB headroom).
    ///
    /// A silent clip is left untouched.
    pub fn normalize(&mut self) {
        let peak = self.peak();
        if peak <= f32::EPSILON {
            return;
        }
        let target = 10f32.powf(-0.1 / 20.0);
        let factor = target / peak;
        for sample in &mut self.samples {
            *sample = (*sample * factor).clamp(-1.0, 1.0);
        }
    }

    /// Maximum absolute amplitude.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |max, s| max.max(s.abs()))
    }

    /// Maximum of per-window peak amplitudes over fixed-size windows.
    pub fn max_window_peak(&self, window_frames: usize) -> f32 {
        let stride = self.channels as usize;
        self.samples
            .chunks(window_frames.max(1) * stride)
            .map(|window| window.iter().fold(0.0f32, |max, s| max.max(s.abs())))
            .fold(0.0f32, f32::max)
    }

    /// Shorten the clip to at most `duration_ms` milliseconds.
    pub fn truncate_ms(&mut self, duration_ms: u64) {
        let frames = Self::ms_to_frames(duration_ms, self.sample_rate).min(self.frames());
        self.samples.truncate(frames * self.channels as usize);
    }
}
