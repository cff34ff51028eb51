use std::path::PathBuf;

use crate::error::{AudioError, Result};

/// Raw decoded audio with metadata
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples (interleaved for stereo, mono for single channel)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,

    /// Original file path
    pub file_path: PathBuf,
}

impl AudioData {
    /// Get a mono mix of all channels
    pub fn mono_samples(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let mut mono = Vec::with_capacity(self.samples.len() / self.channels as usize);

        for chunk in self.samples.chunks(self.channels as usize) {
            let sum: f32 = chunk.iter().sum();
            mono.push(sum / self.channels as f32);
        }

        mono
    }
}

/// Immutable result of analyzing one audio track.
///
/// Beat timestamps are strictly increasing, the first is >= 0 and the last
/// <= `duration`. `energy` and `brightness` are aligned with `beats` by
/// index.
#[derive(Debug, Clone)]
pub struct AudioProfile {
    sample_rate: u32,
    duration: f64,
    beats: Vec<f64>,
    energy: Vec<f32>,
    brightness: Vec<f32>,
}

impl AudioProfile {
    /// Build a profile, verifying the alignment and ordering invariants.
    pub fn new(
        sample_rate: u32,
        duration: f64,
        beats: Vec<f64>,
        energy: Vec<f32>,
        brightness: Vec<f32>,
    ) -> Result<Self> {
        if beats.len() != energy.len() || beats.len() != brightness.len() {
            return Err(AudioError::AnalysisFailed {
                reason: format!(
                    "misaligned features: {} beats, {} energy, {} brightness",
                    beats.len(),
                    energy.len(),
                    brightness.len()
                ),
            }
            .into());
        }

        if !beats.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(AudioError::AnalysisFailed {
                reason: "beat timestamps not strictly increasing".to_string(),
            }
            .into());
        }

        if beats.first().is_some_and(|&t| t < 0.0)
            || beats.last().is_some_and(|&t| t > duration)
        {
            return Err(AudioError::AnalysisFailed {
                reason: "beat timestamps outside the audio duration".to_string(),
            }
            .into());
        }

        if energy.iter().chain(brightness.iter()).any(|&v| v < 0.0) {
            return Err(AudioError::AnalysisFailed {
                reason: "negative feature value".to_string(),
            }
            .into());
        }

        Ok(Self { sample_rate, duration, beats, energy, brightness })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn beats(&self) -> &[f64] {
        &self.beats
    }

    pub fn energy(&self) -> &[f32] {
        &self.energy
    }

    pub fn brightness(&self) -> &[f32] {
        &self.brightness
    }

    /// Number of detected beats
    pub fn beat_count(&self) -> usize {
        self.beats.len()
    }
}
