//! # Synchronization Core
//!
//! Turns an [`AudioProfile`](crate::audio::AudioProfile) and a classified
//! [`SlidePool`](crate::slides::SlidePool) into a verified timeline:
//!
//! - [`planner`] maps beat intervals to slides using percentile thresholds
//!   over the track's energy and brightness contours
//! - [`effects`] derives per-segment zoom and fade from interval energy
//! - [`timeline`] assembles and verifies the final segment sequence

pub mod effects;
pub mod planner;
pub mod timeline;

pub use effects::{EffectParameterizer, EffectParams};
pub use planner::{BeatInterval, PlannedInterval, Planner};
pub use timeline::{RenderPlan, Segment, TimelineAssembler};
