use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlanError, Result};
use crate::slides::SlidePool;
use crate::sync::effects::{EffectParameterizer, EffectParams};
use crate::sync::planner::PlannedInterval;

/// Tolerance for adjacency and coverage checks
const EPSILON: f64 = 1e-6;

/// One output unit of the plan: show one slide for a span of time with
/// the given zoom and symmetric fade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Identifier of the slide to show
    pub image_id: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds, always positive
    pub duration: f64,

    /// Zoom factor, >= 1.0
    pub zoom: f32,

    /// Fade-in/out duration in seconds, at most half the duration
    pub fade: f64,
}

impl Segment {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// The complete, verified output handed to the render sink
#[derive(Debug, Clone, Serialize)]
pub struct RenderPlan {
    /// Ordered, contiguous segments covering the full audio duration
    pub segments: Vec<Segment>,

    /// Duration of the source audio in seconds
    pub audio_duration: f64,

    /// Frame rate for the renderer; unused by the planning core
    pub fps: u32,
}

/// Merges planned intervals and effect parameters into the final segment
/// sequence and verifies the coverage contract.
///
/// Any gap, overlap, or range defect found here is an upstream bug and
/// fails fatally; the timeline is never repaired in place.
pub struct TimelineAssembler {
    merge_repeats: bool,
}

impl TimelineAssembler {
    pub fn new(merge_repeats: bool) -> Self {
        Self { merge_repeats }
    }

    pub fn assemble(
        &self,
        planned: &[PlannedInterval],
        params: &[EffectParams],
        pool: &SlidePool,
        parameterizer: &EffectParameterizer,
        audio_duration: f64,
    ) -> Result<Vec<Segment>> {
        if planned.len() != params.len() {
            return Err(PlanError::TimelineConsistency {
                detail: format!(
                    "{} intervals but {} effect parameter sets",
                    planned.len(),
                    params.len()
                ),
            }
            .into());
        }

        if planned.is_empty() {
            return Err(PlanError::TimelineConsistency {
                detail: "no intervals to assemble".to_string(),
            }
            .into());
        }

        let mut segments: Vec<Segment> = Vec::with_capacity(planned.len());

        for (plan, effect) in planned.iter().zip(params.iter()) {
            let segment = Segment {
                image_id: pool.record(plan.image_index).id.clone(),
                start: plan.interval.start,
                duration: plan.interval.duration(),
                zoom: effect.zoom,
                fade: effect.fade,
            };

            if self.merge_repeats {
                if let Some(previous) = segments.last_mut() {
                    if previous.image_id == segment.image_id {
                        // Coalesce an adjacent repeat: extend the span,
                        // keep the stronger zoom, re-derive the fade for
                        // the new duration.
                        previous.duration = segment.end() - previous.start;
                        previous.zoom = previous.zoom.max(segment.zoom);
                        previous.fade = parameterizer.fade_for(previous.duration);
                        debug!(
                            "Coalesced repeat of '{}' into {:.2}s span",
                            previous.image_id, previous.duration
                        );
                        continue;
                    }
                }
            }

            segments.push(segment);
        }

        verify_segments(&segments, audio_duration)?;
        Ok(segments)
    }
}

/// Check the coverage contract for an assembled timeline: contiguous,
/// non-overlapping, exactly covering `[0, audio_duration)`, with every
/// segment's effect parameters in range.
pub fn verify_segments(segments: &[Segment], audio_duration: f64) -> Result<()> {
    let inconsistent = |detail: String| -> crate::error::SyncError {
        PlanError::TimelineConsistency { detail }.into()
    };

    let first = segments
        .first()
        .ok_or_else(|| inconsistent("timeline is empty".to_string()))?;

    if first.start.abs() > EPSILON {
        return Err(inconsistent(format!("timeline starts at {:.6}s, not 0", first.start)));
    }

    let mut expected_start = 0.0f64;
    for (i, segment) in segments.iter().enumerate() {
        if segment.duration <= 0.0 {
            return Err(inconsistent(format!(
                "segment {} has non-positive duration {:.6}",
                i, segment.duration
            )));
        }

        let drift = segment.start - expected_start;
        if drift > EPSILON {
            return Err(inconsistent(format!(
                "gap of {:.6}s before segment {}",
                drift, i
            )));
        }
        if drift < -EPSILON {
            return Err(inconsistent(format!(
                "segment {} overlaps its predecessor by {:.6}s",
                i, -drift
            )));
        }

        if segment.zoom < 1.0 {
            return Err(inconsistent(format!(
                "segment {} zoom {:.4} below 1.0",
                i, segment.zoom
            )));
        }

        if segment.fade < 0.0 || 2.0 * segment.fade > segment.duration + EPSILON {
            return Err(inconsistent(format!(
                "segment {} fade {:.4}s exceeds half of {:.4}s",
                i, segment.fade, segment.duration
            )));
        }

        expected_start = segment.end();
    }

    if (expected_start - audio_duration).abs() > EPSILON {
        return Err(inconsistent(format!(
            "timeline ends at {:.6}s, audio lasts {:.6}s",
            expected_start, audio_duration
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectConfig;
    use crate::slides::{Category, ImageRecord, SlidePool};
    use crate::sync::planner::BeatInterval;

    fn segment(image_id: &str, start: f64, duration: f64) -> Segment {
        Segment { image_id: image_id.to_string(), start, duration, zoom: 1.0, fade: 0.0 }
    }

    fn pool_of(ids: &[&str]) -> SlidePool {
        SlidePool::from_records(
            ids.iter()
                .map(|id| ImageRecord {
                    id: id.to_string(),
                    brightness: 0.0,
                    contrast: 0.0,
                    category: Category::Calm,
                })
                .collect(),
        )
        .unwrap()
    }

    fn planned(image_index: usize, start: f64, end: f64, energy: f32) -> PlannedInterval {
        PlannedInterval {
            interval: BeatInterval {
                start,
                end,
                energy,
                brightness: 0.0,
                category: Category::Calm,
            },
            image_index,
        }
    }

    #[test]
    fn test_assembles_contiguous_cover() {
        let pool = pool_of(&["a", "b"]);
        let parameterizer = EffectParameterizer::new(EffectConfig::default(), &[1.0, 5.0]);
        let planned = vec![
            planned(0, 0.0, 1.5, 1.0),
            planned(1, 1.5, 3.0, 5.0),
            planned(0, 3.0, 4.0, 1.0),
        ];
        let params: Vec<EffectParams> = planned
            .iter()
            .map(|p| parameterizer.parameterize(p.interval.energy, p.interval.duration()))
            .collect();

        let segments = TimelineAssembler::new(false)
            .assemble(&planned, &params, &pool, &parameterizer, 4.0)
            .unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].image_id, "a");
        assert_eq!(segments[1].image_id, "b");
        let total: f64 = segments.iter().map(|s| s.duration).sum();
        assert!((total - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_gap_is_fatal() {
        let segments = vec![segment("a", 0.0, 1.0), segment("b", 1.5, 1.0)];
        let result = verify_segments(&segments, 2.5);
        assert!(matches!(
            result,
            Err(crate::error::SyncError::Plan(PlanError::TimelineConsistency { .. }))
        ));
    }

    #[test]
    fn test_overlap_is_fatal() {
        let segments = vec![segment("a", 0.0, 1.0), segment("b", 0.8, 1.0)];
        assert!(verify_segments(&segments, 1.8).is_err());
    }

    #[test]
    fn test_short_cover_is_fatal() {
        let segments = vec![segment("a", 0.0, 1.0)];
        assert!(verify_segments(&segments, 2.0).is_err());
        assert!(verify_segments(&segments, 1.0).is_ok());
    }

    #[test]
    fn test_oversized_fade_is_fatal() {
        let mut bad = segment("a", 0.0, 1.0);
        bad.fade = 0.6;
        assert!(verify_segments(&[bad], 1.0).is_err());
    }

    #[test]
    fn test_merge_repeats_coalesces_adjacent_same_slide() {
        let pool = pool_of(&["only"]);
        let parameterizer = EffectParameterizer::new(EffectConfig::default(), &[1.0]);
        let planned = vec![
            planned(0, 0.0, 1.0, 1.0),
            planned(0, 1.0, 2.0, 1.0),
            planned(0, 2.0, 4.0, 1.0),
        ];
        let params: Vec<EffectParams> = planned
            .iter()
            .map(|p| parameterizer.parameterize(p.interval.energy, p.interval.duration()))
            .collect();

        let segments = TimelineAssembler::new(true)
            .assemble(&planned, &params, &pool, &parameterizer, 4.0)
            .unwrap();

        assert_eq!(segments.len(), 1);
        assert!((segments[0].duration - 4.0).abs() < 1e-9);
        assert!(2.0 * segments[0].fade <= segments[0].duration);
    }
}
