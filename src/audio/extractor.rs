use realfft::RealFftPlanner;

use crate::audio::types::AudioProfile;
use crate::config::AudioConfig;
use crate::error::{AudioError, Result};

/// Audio feature extractor producing the beat-aligned profile used by the
/// synchronization planner.
///
/// Beat tracking follows the classic onset-strength / dynamic-programming
/// approach: a spectral-flux envelope is computed over FFT frames, a global
/// tempo period is estimated by autocorrelation, and beats are placed by
/// maximizing accumulated onset strength under a penalty for deviating from
/// the tempo period.
pub struct FeatureExtractor {
    config: AudioConfig,
}

impl FeatureExtractor {
    /// Create an extractor with default configuration
    pub fn new() -> Self {
        Self::with_config(AudioConfig::default())
    }

    /// Create an extractor with custom configuration
    pub fn with_config(config: AudioConfig) -> Self {
        Self { config }
    }

    /// Analyze a mono waveform into an [`AudioProfile`].
    ///
    /// Fails with [`AudioError::InsufficientAudio`] when the track is
    /// shorter than one analysis window or yields fewer than two beats.
    pub fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<AudioProfile> {
        if sample_rate == 0 {
            return Err(AudioError::AnalysisFailed {
                reason: "sample rate is zero".to_string(),
            }
            .into());
        }

        if samples.len() < self.config.window_size {
            return Err(AudioError::InsufficientAudio {
                reason: format!(
                    "{} samples is shorter than one {}-sample analysis window",
                    samples.len(),
                    self.config.window_size
                ),
            }
            .into());
        }

        let duration = samples.len() as f64 / sample_rate as f64;
        let frame_rate = sample_rate as f32 / self.config.hop_size as f32;

        tracing::debug!("Computing onset-strength envelope...");
        let envelope = self.onset_envelope(samples)?;

        tracing::debug!("Estimating tempo period...");
        let period = self.estimate_period(&envelope, frame_rate);

        tracing::debug!("Tracking beats (period: {:.1} frames)...", period);
        let beat_frames = self.track_beats(&envelope, period);

        let beats: Vec<f64> = beat_frames
            .iter()
            .map(|&f| (f * self.config.hop_size) as f64 / sample_rate as f64)
            .filter(|&t| t <= duration)
            .collect();

        if beats.len() < 2 {
            return Err(AudioError::InsufficientAudio {
                reason: format!("only {} beat(s) detected, need at least 2", beats.len()),
            }
            .into());
        }

        let energy: Vec<f32> = beats
            .iter()
            .map(|&t| self.rms_at(samples, sample_rate, t))
            .collect();

        let brightness: Vec<f32> = beats
            .iter()
            .map(|&t| self.centroid_at(samples, sample_rate, t))
            .collect::<Result<_>>()?;

        tracing::info!(
            "Extracted {} beats over {:.1}s ({:.1} BPM estimate)",
            beats.len(),
            duration,
            60.0 * frame_rate / period
        );

        AudioProfile::new(sample_rate, duration, beats, energy, brightness)
    }

    /// Spectral-flux onset envelope over Hann-windowed FFT frames
    fn onset_envelope(&self, samples: &[f32]) -> Result<Vec<f32>> {
        let window_size = self.config.window_size;
        let mut planner = RealFftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);
        let mut input_buffer = fft.make_input_vec();
        let mut spectrum_buffer = fft.make_output_vec();

        let hann: Vec<f32> = (0..window_size)
            .map(|i| {
                0.5 * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / (window_size - 1) as f32).cos())
            })
            .collect();

        let mut previous_magnitude = vec![0.0f32; window_size / 2 + 1];
        let mut envelope = Vec::new();

        for window in samples.windows(window_size).step_by(self.config.hop_size) {
            for (i, &sample) in window.iter().enumerate() {
                input_buffer[i] = sample * hann[i];
            }

            fft.process(&mut input_buffer, &mut spectrum_buffer)
                .map_err(|_| AudioError::AnalysisFailed {
                    reason: "FFT processing failed".to_string(),
                })?;

            let current_magnitude: Vec<f32> =
                spectrum_buffer.iter().map(|c| c.norm()).collect();

            // Half-wave rectified frame-to-frame difference
            let flux: f32 = current_magnitude
                .iter()
                .zip(previous_magnitude.iter())
                .map(|(&curr, &prev)| (curr - prev).max(0.0))
                .sum();

            envelope.push(flux);
            previous_magnitude.copy_from_slice(&current_magnitude);
        }

        // Normalize so the tracker's deviation penalty has a stable scale
        let max = envelope.iter().fold(0.0f32, |acc, &x| acc.max(x));
        if max > 0.0 {
            for value in envelope.iter_mut() {
                *value /= max;
            }
        }

        Ok(envelope)
    }

    /// Estimate the beat period in envelope frames via autocorrelation,
    /// constrained to the configured BPM range and weighted toward 120 BPM.
    fn estimate_period(&self, envelope: &[f32], frame_rate: f32) -> f32 {
        let default_period = frame_rate * 0.5; // 120 BPM

        let min_lag = (60.0 * frame_rate / self.config.max_bpm).floor().max(1.0) as usize;
        let max_lag = (60.0 * frame_rate / self.config.min_bpm).ceil() as usize;

        if envelope.len() <= min_lag + 1 {
            return default_period;
        }
        let max_lag = max_lag.min(envelope.len() - 1);

        let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
        let centered: Vec<f32> = envelope.iter().map(|&x| x - mean).collect();

        let mut best_lag = default_period;
        let mut best_score = f32::MIN;

        for lag in min_lag..=max_lag {
            let corr: f32 = centered[lag..]
                .iter()
                .zip(centered.iter())
                .map(|(&a, &b)| a * b)
                .sum();

            // Log-normal preference centered on 120 BPM
            let octave = (lag as f32 / default_period).log2();
            let weight = (-0.5 * octave * octave).exp();
            let score = corr * weight;

            if score > best_score {
                best_score = score;
                best_lag = lag as f32;
            }
        }

        if best_score <= 0.0 {
            // Flat or featureless envelope, fall back to the tempo prior
            return default_period;
        }

        best_lag
    }

    /// Dynamic-programming beat placement over the onset envelope.
    ///
    /// `score[i] = envelope[i] + max_j(score[j] - tightness * ln((i-j)/period)^2)`
    /// with `j` ranging over roughly half to twice the period behind `i`.
    /// Backtracking from the best-scoring tail frame yields the beat grid.
    fn track_beats(&self, envelope: &[f32], period: f32) -> Vec<usize> {
        let n = envelope.len();
        if n == 0 {
            return Vec::new();
        }

        let period = period.max(1.0);
        let tightness = self.config.beat_tightness;

        let mut score = vec![0.0f32; n];
        let mut backlink: Vec<Option<usize>> = vec![None; n];

        let min_step = (period / 2.0).round().max(1.0) as usize;
        let max_step = (period * 2.0).round() as usize;

        for i in 0..n {
            let mut best: Option<(f32, usize)> = None;

            if i >= min_step {
                let lo = i.saturating_sub(max_step);
                let hi = i - min_step;
                for j in lo..=hi {
                    let stretch = (i - j) as f32 / period;
                    let candidate = score[j] - tightness * stretch.ln().powi(2);
                    if best.map_or(true, |(s, _)| candidate > s) {
                        best = Some((candidate, j));
                    }
                }
            }

            match best {
                Some((s, j)) => {
                    score[i] = envelope[i] + s;
                    backlink[i] = Some(j);
                }
                None => score[i] = envelope[i],
            }
        }

        // Start backtracking from the best frame in the final period
        let tail_start = n.saturating_sub(period.round() as usize);
        let last = (tail_start..n)
            .max_by(|&a, &b| score[a].partial_cmp(&score[b]).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(n - 1);

        let mut beats = Vec::new();
        let mut cursor = Some(last);
        while let Some(i) = cursor {
            beats.push(i);
            cursor = backlink[i];
        }
        beats.reverse();
        beats
    }

    /// RMS amplitude over a short centered window
    fn rms_at(&self, samples: &[f32], sample_rate: u32, time: f64) -> f32 {
        let half = self.config.feature_window / 2.0;
        let start = ((time - half) * sample_rate as f64).max(0.0) as usize;
        let end = (((time + half) * sample_rate as f64) as usize).min(samples.len());

        if start >= end {
            return 0.0;
        }

        let window = &samples[start..end];
        (window.iter().map(|&x| x * x).sum::<f32>() / window.len() as f32).sqrt()
    }

    /// Power-weighted mean frequency (spectral centroid, Hz) over a
    /// window centered at the given time
    fn centroid_at(&self, samples: &[f32], sample_rate: u32, time: f64) -> Result<f32> {
        let window_size = self.config.window_size;
        let center = (time * sample_rate as f64) as usize;
        let start = center.saturating_sub(window_size / 2).min(samples.len().saturating_sub(1));
        let end = (start + window_size).min(samples.len());

        let mut planner = RealFftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);
        let mut input_buffer = fft.make_input_vec();
        let mut spectrum_buffer = fft.make_output_vec();

        let window = &samples[start..end];
        for (i, slot) in input_buffer.iter_mut().enumerate() {
            let hann = 0.5
                * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / (window_size - 1) as f32).cos());
            *slot = window.get(i).copied().unwrap_or(0.0) * hann;
        }

        fft.process(&mut input_buffer, &mut spectrum_buffer)
            .map_err(|_| AudioError::AnalysisFailed {
                reason: "FFT processing failed".to_string(),
            })?;

        let bin_width = sample_rate as f32 / window_size as f32;
        let mut total_power = 0.0f32;
        let mut weighted = 0.0f32;
        for (k, c) in spectrum_buffer.iter().enumerate() {
            let power = c.norm_sqr();
            total_power += power;
            weighted += k as f32 * bin_width * power;
        }

        if total_power <= f32::EPSILON {
            return Ok(0.0);
        }

        Ok(weighted / total_power)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 8000;

    /// 120 BPM click track: a short burst every half second
    fn click_track(seconds: f64) -> Vec<f32> {
        let mut samples = vec![0.0f32; (seconds * SR as f64) as usize];
        let step = SR as usize / 2;
        for click_start in (0..samples.len()).step_by(step) {
            for (i, sample) in samples[click_start..].iter_mut().take(64).enumerate() {
                *sample = 0.9 * (1.0 - i as f32 / 64.0);
            }
        }
        samples
    }

    #[test]
    fn test_click_track_beats() {
        let samples = click_track(8.0);
        let extractor = FeatureExtractor::new();

        let profile = extractor.extract(&samples, SR).unwrap();
        assert!(profile.beat_count() >= 2);
        assert!((profile.duration() - 8.0).abs() < 1e-6);
        assert!(profile.beats().windows(2).all(|p| p[0] < p[1]));
        assert!(profile.energy().iter().all(|&e| e >= 0.0));
        assert!(profile.brightness().iter().all(|&b| b >= 0.0));
    }

    #[test]
    fn test_short_audio_is_insufficient() {
        // 0.2 seconds, below the minimum usable analysis length
        let samples = vec![0.1f32; (0.2 * SR as f64) as usize];
        let extractor = FeatureExtractor::new();

        let result = extractor.extract(&samples, SR);
        assert!(matches!(
            result,
            Err(crate::error::SyncError::Audio(AudioError::InsufficientAudio { .. }))
        ));
    }

    #[test]
    fn test_silent_audio_is_valid() {
        let samples = vec![0.0f32; 4 * SR as usize];
        let extractor = FeatureExtractor::new();

        // Silence still yields a regular beat grid, with zero energy
        let profile = extractor.extract(&samples, SR).unwrap();
        assert!(profile.beat_count() >= 2);
        assert!(profile.energy().iter().all(|&e| e == 0.0));
    }

    #[test]
    fn test_rms_of_constant_signal() {
        let extractor = FeatureExtractor::new();
        let samples = vec![0.5f32; SR as usize];

        let rms = extractor.rms_at(&samples, SR, 0.5);
        assert!((rms - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_centroid_tracks_tone_frequency() {
        let extractor = FeatureExtractor::new();
        let tone: Vec<f32> = (0..SR as usize * 2)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / SR as f32).sin())
            .collect();

        let centroid = extractor.centroid_at(&tone, SR, 1.0).unwrap();
        assert!((centroid - 1000.0).abs() < 100.0, "centroid was {}", centroid);
    }
}
