//! # Lecture-Compositor
//!
//! Turn a lecture recording and a folder of slide images into a
//! beat-synchronized video plan.
//!
//! The library analyzes the audio's rhythmic and energy structure,
//! classifies each slide by visual character, and selects, orders, and
//! animates slides to match the audio's energy contour. The result is a
//! verified timeline of render instructions handed to an external encoder
//! through the [`RenderSink`](render::RenderSink) boundary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lecture_compositor::{
//!     composition::CompositionEngine,
//!     config::Config,
//!     render::JsonPlanSink,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let engine = CompositionEngine::new(Config::default());
//! engine.compose(
//!     "lecture.wav",
//!     "slides/",
//!     "plan.json",
//!     &JsonPlanSink::new(),
//! ).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The pipeline runs strictly forward, one pass per stage:
//!
//! - [`audio`] - waveform loading, beat detection, per-beat features
//! - [`slides`] - slide loading and brightness/contrast classification
//! - [`sync`] - interval planning, effect parameterization, timeline assembly
//! - [`composition`] - the engine that orchestrates a run
//! - [`render`] - the sink boundary toward the external encoder
//!
//! Slide classification fans out across a worker pool; every other stage
//! is sequential because planning threads selection state through the
//! intervals in time order.

pub mod audio;
pub mod composition;
pub mod config;
pub mod error;
pub mod render;
pub mod slides;
pub mod sync;

// Re-export commonly used types for convenience
pub use crate::{
    composition::CompositionEngine,
    config::Config,
    error::{Result, SyncError},
    render::{JsonPlanSink, RenderSink},
    sync::{RenderPlan, Segment},
};
