use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::audio::AudioProfile;
use crate::config::PlannerConfig;
use crate::error::{Result, SlideError};
use crate::slides::{Category, SlidePool};

/// Intervals narrower than this are dropped as empty
const MIN_INTERVAL: f64 = 1e-9;

/// The time span opened by one beat, carrying that beat's features.
///
/// Ephemeral: produced and consumed inside the planner.
#[derive(Debug, Clone)]
pub struct BeatInterval {
    pub start: f64,
    pub end: f64,
    pub energy: f32,
    pub brightness: f32,
    pub category: Category,
}

impl BeatInterval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One interval bound to its selected slide
#[derive(Debug, Clone)]
pub struct PlannedInterval {
    pub interval: BeatInterval,
    /// Index into the pool's record list
    pub image_index: usize,
}

/// Maps beat intervals to slides.
///
/// Runs in two passes: first every interval is built and its
/// energy/brightness collected so the percentile thresholds see the whole
/// track, then categories are assigned and slides selected in time order.
/// Selection state is a single `last_selected` accumulator threaded through
/// the fold, never ambient.
pub struct Planner<'a> {
    profile: &'a AudioProfile,
    pool: &'a SlidePool,
    config: &'a PlannerConfig,
}

impl<'a> Planner<'a> {
    pub fn new(profile: &'a AudioProfile, pool: &'a SlidePool, config: &'a PlannerConfig) -> Self {
        Self { profile, pool, config }
    }

    /// Produce the ordered interval-to-slide binding for the whole track
    pub fn plan(&self) -> Result<Vec<PlannedInterval>> {
        let mut intervals = self.build_intervals();

        let energies: Vec<f64> = intervals.iter().map(|i| i.energy as f64).collect();
        let brightnesses: Vec<f64> = intervals.iter().map(|i| i.brightness as f64).collect();

        let energy_threshold = percentile(&energies, self.config.energy_percentile);
        let brightness_threshold = percentile(&brightnesses, self.config.brightness_percentile);

        debug!(
            "Thresholds over {} intervals: energy {:.4} (p{}), brightness {:.4} (p{})",
            intervals.len(),
            energy_threshold,
            self.config.energy_percentile,
            brightness_threshold,
            self.config.brightness_percentile,
        );

        for interval in intervals.iter_mut() {
            interval.category =
                assign_category(interval, energy_threshold, brightness_threshold);
        }

        let mut rng = match self.config.random_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let mut planned = Vec::with_capacity(intervals.len());
        let mut last_selected: Option<usize> = None;

        for interval in intervals {
            let image_index = self.select_image(interval.category, last_selected, &mut rng)?;
            last_selected = Some(image_index);
            planned.push(PlannedInterval { interval, image_index });
        }

        Ok(planned)
    }

    /// Build intervals from consecutive beats, plus a leading interval from
    /// zero to the first beat and a trailing interval to the audio end,
    /// each only when non-empty. Every interval carries the features of the
    /// beat that opens it (the leading one borrows the first beat's).
    fn build_intervals(&self) -> Vec<BeatInterval> {
        let beats = self.profile.beats();
        let energy = self.profile.energy();
        let brightness = self.profile.brightness();
        let duration = self.profile.duration();

        let mut intervals = Vec::with_capacity(beats.len() + 1);

        if let Some(&first) = beats.first() {
            if first > MIN_INTERVAL {
                intervals.push(BeatInterval {
                    start: 0.0,
                    end: first,
                    energy: energy[0],
                    brightness: brightness[0],
                    category: Category::Calm,
                });
            }
        }

        for (i, pair) in beats.windows(2).enumerate() {
            if pair[1] - pair[0] > MIN_INTERVAL {
                intervals.push(BeatInterval {
                    start: pair[0],
                    end: pair[1],
                    energy: energy[i],
                    brightness: brightness[i],
                    category: Category::Calm,
                });
            }
        }

        if let Some(&last) = beats.last() {
            if duration - last > MIN_INTERVAL {
                let i = beats.len() - 1;
                intervals.push(BeatInterval {
                    start: last,
                    end: duration,
                    energy: energy[i],
                    brightness: brightness[i],
                    category: Category::Calm,
                });
            }
        }

        intervals
    }

    /// Select a slide for one interval.
    ///
    /// Uniform draw from the category's pool, falling back across
    /// CALM -> DYNAMIC -> BRIGHT -> the whole pool when the matching pool
    /// is empty. A draw that repeats the previous slide is redrawn without
    /// it when the effective pool has at least two members; a singleton
    /// pool is allowed to repeat.
    fn select_image(
        &self,
        category: Category,
        last_selected: Option<usize>,
        rng: &mut SmallRng,
    ) -> Result<usize> {
        let members = self.effective_members(category)?;

        let pick = members[rng.gen_range(0..members.len())];
        if last_selected == Some(pick) && members.len() >= 2 {
            let remaining: Vec<usize> =
                members.iter().copied().filter(|&i| Some(i) != last_selected).collect();
            return Ok(remaining[rng.gen_range(0..remaining.len())]);
        }

        Ok(pick)
    }

    fn effective_members(&self, category: Category) -> Result<Vec<usize>> {
        let members = self.pool.members(category);
        if !members.is_empty() {
            return Ok(members.to_vec());
        }

        for fallback in Category::FALLBACK_ORDER {
            let members = self.pool.members(fallback);
            if !members.is_empty() {
                debug!("Category {:?} pool empty, falling back to {:?}", category, fallback);
                return Ok(members.to_vec());
            }
        }

        if !self.pool.is_empty() {
            return Ok((0..self.pool.len()).collect());
        }

        Err(SlideError::NoUsableImages {
            reason: format!("no slide available for {:?} intervals", category),
        }
        .into())
    }
}

/// Category precedence: both thresholds met is BRIGHT, energy alone is
/// DYNAMIC, everything else CALM.
fn assign_category(interval: &BeatInterval, energy_threshold: f64, brightness_threshold: f64) -> Category {
    let energetic = interval.energy as f64 >= energy_threshold;
    let bright = interval.brightness as f64 >= brightness_threshold;

    match (energetic, bright) {
        (true, true) => Category::Bright,
        (true, false) => Category::Dynamic,
        _ => Category::Calm,
    }
}

/// Linear-interpolation percentile (the numpy definition).
///
/// Monotone in `q`, which the planner's threshold sensitivity relies on.
/// Returns 0.0 for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;

    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::ImageRecord;

    fn profile(duration: f64, beats: Vec<f64>, energy: Vec<f32>, brightness: Vec<f32>) -> AudioProfile {
        AudioProfile::new(44100, duration, beats, energy, brightness).unwrap()
    }

    fn record(id: &str, category: Category) -> ImageRecord {
        ImageRecord { id: id.to_string(), brightness: 0.0, contrast: 0.0, category }
    }

    fn seeded(seed: u64) -> PlannerConfig {
        PlannerConfig { random_seed: Some(seed), ..PlannerConfig::default() }
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = vec![1.0, 1.0, 5.0, 5.0];
        assert!((percentile(&values, 75.0) - 5.0).abs() < 1e-9);
        assert!((percentile(&values, 60.0) - 4.2).abs() < 1e-9);
        assert!((percentile(&values, 0.0) - 1.0).abs() < 1e-9);
        assert!((percentile(&values, 100.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_monotone_in_q() {
        let values = vec![0.3, 1.7, 0.9, 4.2, 2.8];
        let mut previous = f64::MIN;
        for q in 0..=100 {
            let p = percentile(&values, q as f64);
            assert!(p >= previous);
            previous = p;
        }
    }

    #[test]
    fn test_interval_construction_with_edges() {
        let profile = profile(2.0, vec![0.5, 1.0], vec![0.1, 0.2], vec![1.0, 2.0]);
        let pool = SlidePool::from_records(vec![record("a", Category::Calm)]).unwrap();
        let config = seeded(1);
        let planner = Planner::new(&profile, &pool, &config);

        let intervals = planner.build_intervals();
        assert_eq!(intervals.len(), 3);
        assert_eq!((intervals[0].start, intervals[0].end), (0.0, 0.5));
        assert_eq!((intervals[1].start, intervals[1].end), (0.5, 1.0));
        assert_eq!((intervals[2].start, intervals[2].end), (1.0, 2.0));
        // Leading interval borrows the first beat's features
        assert_eq!(intervals[0].energy, 0.1);
        // Trailing interval borrows the last beat's features
        assert_eq!(intervals[2].energy, 0.2);
    }

    #[test]
    fn test_alternating_energy_selects_alternating_slides() {
        // Four beats on a 4s clip; energy alternates low/high, brightness
        // runs inverse to energy so the loud intervals classify DYNAMIC.
        let profile = profile(
            4.0,
            vec![0.0, 1.0, 2.0, 3.0],
            vec![1.0, 5.0, 1.0, 5.0],
            vec![5.0, 1.0, 5.0, 1.0],
        );
        let pool = SlidePool::from_records(vec![
            record("imgA", Category::Calm),
            record("imgB", Category::Dynamic),
        ])
        .unwrap();
        let config = seeded(7);
        let planner = Planner::new(&profile, &pool, &config);

        let planned = planner.plan().unwrap();
        assert_eq!(planned.len(), 4);

        let ids: Vec<&str> = planned
            .iter()
            .map(|p| pool.record(p.image_index).id.as_str())
            .collect();
        assert_eq!(ids, vec!["imgA", "imgB", "imgA", "imgB"]);
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let profile = profile(
            8.0,
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
            vec![1.0, 3.0, 2.0, 8.0, 1.0, 9.0, 2.0, 4.0],
            vec![100.0, 300.0, 200.0, 800.0, 100.0, 900.0, 200.0, 400.0],
        );
        let pool = SlidePool::from_records(vec![
            record("a", Category::Calm),
            record("b", Category::Calm),
            record("c", Category::Dynamic),
            record("d", Category::Bright),
        ])
        .unwrap();
        let config = seeded(123);

        let first: Vec<usize> = Planner::new(&profile, &pool, &config)
            .plan()
            .unwrap()
            .iter()
            .map(|p| p.image_index)
            .collect();
        let second: Vec<usize> = Planner::new(&profile, &pool, &config)
            .plan()
            .unwrap()
            .iter()
            .map(|p| p.image_index)
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_no_consecutive_repeats_with_plural_pool() {
        let beats: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let energy = vec![1.0f32; 20];
        let brightness = vec![1.0f32; 20];
        let profile = profile(10.0, beats, energy, brightness);

        let pool = SlidePool::from_records(vec![
            record("a", Category::Bright),
            record("b", Category::Bright),
            record("c", Category::Bright),
        ])
        .unwrap();
        let config = seeded(99);
        let planned = Planner::new(&profile, &pool, &config).plan().unwrap();

        for pair in planned.windows(2) {
            assert_ne!(pair[0].image_index, pair[1].image_index);
        }
    }

    #[test]
    fn test_singleton_pool_repeats_without_error() {
        let profile = profile(
            4.0,
            vec![0.0, 1.0, 2.0, 3.0],
            vec![1.0, 5.0, 1.0, 5.0],
            vec![1.0, 5.0, 1.0, 5.0],
        );
        let pool = SlidePool::from_records(vec![record("only", Category::Calm)]).unwrap();
        let config = seeded(5);

        let planned = Planner::new(&profile, &pool, &config).plan().unwrap();
        assert_eq!(planned.len(), 4);
        assert!(planned.iter().all(|p| p.image_index == 0));
    }

    #[test]
    fn test_fallback_order_prefers_calm() {
        // All intervals classify BRIGHT (flat features degenerate both
        // thresholds), but the pool has no bright slides.
        let profile = profile(
            3.0,
            vec![0.0, 1.0, 2.0],
            vec![2.0, 2.0, 2.0],
            vec![2.0, 2.0, 2.0],
        );
        let pool = SlidePool::from_records(vec![
            record("calm", Category::Calm),
            record("dynamic", Category::Dynamic),
        ])
        .unwrap();
        let config = seeded(11);

        let planned = Planner::new(&profile, &pool, &config).plan().unwrap();
        // CALM precedes DYNAMIC in the fallback order; with a repeat-free
        // draw over a singleton effective pool every interval lands on it.
        assert_eq!(pool.record(planned[0].image_index).id, "calm");
        assert!(planned.iter().all(|p| pool.record(p.image_index).id == "calm"));
    }

    #[test]
    fn test_raising_energy_percentile_never_adds_energetic_intervals() {
        let profile = profile(
            6.0,
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        );
        let pool = SlidePool::from_records(vec![
            record("a", Category::Bright),
            record("b", Category::Dynamic),
            record("c", Category::Calm),
        ])
        .unwrap();

        let energetic_count = |energy_percentile: f64| -> usize {
            let config = PlannerConfig {
                energy_percentile,
                random_seed: Some(1),
                ..PlannerConfig::default()
            };
            Planner::new(&profile, &pool, &config)
                .plan()
                .unwrap()
                .iter()
                .filter(|p| p.interval.category != Category::Calm)
                .count()
        };

        let mut previous = usize::MAX;
        for q in [10.0, 25.0, 50.0, 75.0, 90.0, 100.0] {
            let count = energetic_count(q);
            assert!(count <= previous, "p{} produced {} > {}", q, count, previous);
            previous = count;
        }
    }

    #[test]
    fn test_silent_audio_degenerates_to_one_category() {
        let profile = profile(
            3.0,
            vec![0.0, 1.0, 2.0],
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
        );
        let pool = SlidePool::from_records(vec![record("only", Category::Calm)]).unwrap();
        let config = seeded(3);

        let planned = Planner::new(&profile, &pool, &config).plan().unwrap();
        assert!(planned.iter().all(|p| p.interval.category == Category::Bright));
        assert!(planned.iter().all(|p| p.image_index == 0));
    }
}
