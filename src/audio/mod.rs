//! # Audio Feature Extraction
//!
//! Loads a lecture recording and distills it into the beat-aligned profile
//! that drives slide sequencing: beat timestamps, per-beat RMS energy, and
//! per-beat spectral centroid ("brightness of sound").
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lecture_compositor::audio::{AudioLoader, FeatureExtractor};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let audio = AudioLoader::load("lecture.wav").await?;
//! let profile = FeatureExtractor::new().extract(&audio.mono_samples(), audio.sample_rate)?;
//!
//! println!("Detected {} beats", profile.beat_count());
//! # Ok(())
//! # }
//! ```

pub mod extractor;
pub mod loader;
pub mod types;

pub use extractor::FeatureExtractor;
pub use loader::AudioLoader;
pub use types::{AudioData, AudioProfile};
