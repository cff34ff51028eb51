use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for the Lecture-Compositor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Audio feature extraction settings
    pub audio: AudioConfig,

    /// Slide classification settings
    pub classifier: ClassifierConfig,

    /// Synchronization planner settings
    pub planner: PlannerConfig,

    /// Per-segment effect parameterization settings
    pub effects: EffectConfig,

    /// Output settings propagated to the render sink
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            classifier: ClassifierConfig::default(),
            planner: PlannerConfig::default(),
            effects: EffectConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.audio.validate()?;
        self.classifier.validate()?;
        self.planner.validate()?;
        self.effects.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

/// Audio feature extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Window size for FFT analysis
    pub window_size: usize,

    /// Hop size for analysis windows
    pub hop_size: usize,

    /// Minimum BPM to consider during tempo estimation
    pub min_bpm: f32,

    /// Maximum BPM to consider during tempo estimation
    pub max_bpm: f32,

    /// Deviation penalty for the beat tracker. Higher values force beats
    /// closer to the estimated tempo grid.
    pub beat_tightness: f32,

    /// Width in seconds of the centered window used for per-beat
    /// energy and brightness measurements
    pub feature_window: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            hop_size: 512,
            min_bpm: 60.0,
            max_bpm: 200.0,
            beat_tightness: 100.0,
            feature_window: 0.1,
        }
    }
}

impl AudioConfig {
    fn validate(&self) -> Result<()> {
        if self.window_size == 0 || !self.window_size.is_power_of_two() {
            return Err(ConfigError::InvalidValue {
                key: "audio.window_size".to_string(),
                value: self.window_size.to_string()
            }.into());
        }

        if self.hop_size == 0 || self.hop_size > self.window_size {
            return Err(ConfigError::InvalidValue {
                key: "audio.hop_size".to_string(),
                value: self.hop_size.to_string()
            }.into());
        }

        if self.min_bpm >= self.max_bpm {
            return Err(ConfigError::InvalidValue {
                key: "audio.bpm_range".to_string(),
                value: format!("{}-{}", self.min_bpm, self.max_bpm)
            }.into());
        }

        if self.feature_window <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "audio.feature_window".to_string(),
                value: self.feature_window.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Slide classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Mean luminance above which a slide is BRIGHT (0-255 scale)
    pub brightness_threshold: f32,

    /// Luminance standard deviation above which a slide is DYNAMIC
    pub contrast_threshold: f32,

    /// Number of worker threads for batch classification
    pub processing_threads: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            brightness_threshold: 150.0,
            contrast_threshold: 50.0,
            processing_threads: num_cpus::get(),
        }
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=255.0).contains(&self.brightness_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "classifier.brightness_threshold".to_string(),
                value: self.brightness_threshold.to_string()
            }.into());
        }

        if self.contrast_threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "classifier.contrast_threshold".to_string(),
                value: self.contrast_threshold.to_string()
            }.into());
        }

        if self.processing_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "classifier.processing_threads".to_string(),
                value: self.processing_threads.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Synchronization planner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Percentile of interval energies used as the energy threshold (0-100)
    pub energy_percentile: f64,

    /// Percentile of interval brightness used as the brightness threshold (0-100)
    pub brightness_percentile: f64,

    /// Seed for image selection. A fixed seed makes two runs over the same
    /// inputs produce identical plans.
    pub random_seed: Option<u64>,

    /// Coalesce adjacent segments that reference the same slide. Only
    /// reachable through single-image category pools, so off by default.
    pub merge_repeats: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            energy_percentile: 75.0,
            brightness_percentile: 60.0,
            random_seed: None,
            merge_repeats: false,
        }
    }
}

impl PlannerConfig {
    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("planner.energy_percentile", self.energy_percentile),
            ("planner.brightness_percentile", self.brightness_percentile),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string()
                }.into());
            }
        }

        Ok(())
    }
}

/// Effect parameterization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectConfig {
    /// Maximum zoom added on top of 1.0 at full normalized energy
    pub max_zoom_bonus: f32,

    /// Upper bound on the fade applied at each end of a segment (seconds)
    pub max_fade_seconds: f64,

    /// Fraction of the segment duration used as the fade length before
    /// clamping
    pub fade_ratio: f64,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            max_zoom_bonus: 0.3,
            max_fade_seconds: 0.5,
            fade_ratio: 0.2,
        }
    }
}

impl EffectConfig {
    fn validate(&self) -> Result<()> {
        if self.max_zoom_bonus < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "effects.max_zoom_bonus".to_string(),
                value: self.max_zoom_bonus.to_string()
            }.into());
        }

        if self.max_fade_seconds < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "effects.max_fade_seconds".to_string(),
                value: self.max_fade_seconds.to_string()
            }.into());
        }

        if !(0.0..=0.5).contains(&self.fade_ratio) {
            return Err(ConfigError::InvalidValue {
                key: "effects.fade_ratio".to_string(),
                value: self.fade_ratio.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Output configuration. Not used by the planning core; carried on the
/// render plan for the external encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Target frame rate for the rendered video
    pub fps: u32,

    /// Target resolution (width, height)
    pub resolution: (u32, u32),
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fps: 25,
            resolution: (1280, 720),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "output.fps".to_string(),
                value: self.fps.to_string()
            }.into());
        }

        Ok(())
    }
}
