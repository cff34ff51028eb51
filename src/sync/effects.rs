use crate::config::EffectConfig;

/// Visual effect parameters for one segment (the Ken Burns numbers)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// Zoom factor, 1.0 at rest up to `1.0 + max_zoom_bonus`
    pub zoom: f32,

    /// Fade applied symmetrically at both segment ends, in seconds
    pub fade: f64,
}

/// Derives per-segment zoom and fade from interval energy and duration.
///
/// Energy is normalized into [0, 1] against the range observed across the
/// whole run, so the zoom scale is unit-free regardless of how loud the
/// recording is.
pub struct EffectParameterizer {
    config: EffectConfig,
    energy_min: f32,
    energy_max: f32,
}

impl EffectParameterizer {
    /// Create a parameterizer calibrated to the run's observed energies
    pub fn new(config: EffectConfig, energies: &[f32]) -> Self {
        let energy_min = energies.iter().copied().fold(f32::INFINITY, f32::min);
        let energy_max = energies.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        Self { config, energy_min, energy_max }
    }

    /// Compute the effect parameters for one interval
    pub fn parameterize(&self, energy: f32, duration: f64) -> EffectParams {
        let normalized = self.normalize(energy);
        let zoom = 1.0 + normalized * self.config.max_zoom_bonus;

        let mut fade = self.config.max_fade_seconds.min(duration * self.config.fade_ratio);
        if 2.0 * fade > duration {
            fade = duration / 2.0;
        }

        EffectParams { zoom, fade: fade.max(0.0) }
    }

    /// Re-derive a fade for a merged segment duration, same clamping rule
    pub fn fade_for(&self, duration: f64) -> f64 {
        self.parameterize(self.energy_min, duration).fade
    }

    fn normalize(&self, energy: f32) -> f32 {
        let range = self.energy_max - self.energy_min;
        if !range.is_finite() || range <= f32::EPSILON {
            // Flat energy contour, no zoom emphasis to distribute
            return 0.0;
        }

        ((energy - self.energy_min) / range).clamp(0.0, 1.0)
    }
}
