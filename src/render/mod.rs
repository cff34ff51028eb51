//! # Render Sink Boundary
//!
//! The planning core never encodes video itself. It hands a verified
//! [`RenderPlan`] across the [`RenderSink`] trait to whatever backend the
//! caller wires in (an FFmpeg invocation, a remote encoder, a test double).
//!
//! [`JsonPlanSink`] is the bundled reference sink: it serializes the plan
//! and a generation report to a JSON file, which keeps the pipeline
//! exercisable end to end without a codec.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::error::{Result, SyncError};
use crate::sync::{RenderPlan, Segment};

/// The external render/encode collaborator boundary.
///
/// Implementations receive the complete, invariant-checked segment
/// sequence plus the source audio reference and are responsible for the
/// actual output artifact.
pub trait RenderSink: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// Consume the plan and produce the output artifact
    fn render(&self, plan: &RenderPlan, audio_path: &Path, output_path: &Path) -> Result<()>;
}

/// Reference sink that writes the plan as a JSON document
pub struct JsonPlanSink;

impl JsonPlanSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonPlanSink {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct PlanDocument<'a> {
    generated_at: String,
    audio: String,
    audio_duration: f64,
    fps: u32,
    segment_count: usize,
    segments: &'a [Segment],
}

impl RenderSink for JsonPlanSink {
    fn name(&self) -> &str {
        "json-plan"
    }

    fn render(&self, plan: &RenderPlan, audio_path: &Path, output_path: &Path) -> Result<()> {
        let document = PlanDocument {
            generated_at: Utc::now().to_rfc3339(),
            audio: audio_path.display().to_string(),
            audio_duration: plan.audio_duration,
            fps: plan.fps,
            segment_count: plan.segments.len(),
            segments: &plan.segments,
        };

        let content = serde_json::to_string_pretty(&document)
            .map_err(|e| SyncError::Render { reason: e.to_string() })?;
        std::fs::write(output_path, content)?;

        info!(
            "Wrote plan with {} segments to {:?}",
            plan.segments.len(),
            output_path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_plan() -> RenderPlan {
        RenderPlan {
            segments: vec![
                Segment {
                    image_id: "01_intro.png".to_string(),
                    start: 0.0,
                    duration: 2.0,
                    zoom: 1.1,
                    fade: 0.4,
                },
                Segment {
                    image_id: "02_body.png".to_string(),
                    start: 2.0,
                    duration: 3.0,
                    zoom: 1.3,
                    fade: 0.5,
                },
            ],
            audio_duration: 5.0,
            fps: 25,
        }
    }

    #[test]
    fn test_json_sink_writes_plan_document() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("plan.json");

        let sink = JsonPlanSink::new();
        sink.render(&sample_plan(), Path::new("lecture.wav"), &output).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["segment_count"], 2);
        assert_eq!(value["fps"], 25);
        assert_eq!(value["audio"], "lecture.wav");
        assert_eq!(value["segments"][0]["image_id"], "01_intro.png");
        assert_eq!(value["segments"][1]["zoom"], 1.3);
        assert!(value["generated_at"].is_string());
    }
}
