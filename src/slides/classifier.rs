use image::RgbImage;
use rayon::prelude::*;

use crate::config::ClassifierConfig;
use crate::error::{Result, SlideError};
use crate::slides::types::{Category, ImageRecord, SlideImage, SlidePool};

/// Classify one decoded slide into (brightness, contrast, category).
///
/// Brightness is the mean ITU-R 601 luminance, contrast its standard
/// deviation. The category rule applies fixed thresholds in precedence
/// order: bright first, then dynamic, else calm.
pub fn classify_image(pixels: &RgbImage, config: &ClassifierConfig) -> (f32, f32, Category) {
    let (brightness, contrast) = luminance_stats(pixels);

    let category = if brightness > config.brightness_threshold {
        Category::Bright
    } else if contrast > config.contrast_threshold {
        Category::Dynamic
    } else {
        Category::Calm
    };

    (brightness, contrast, category)
}

/// Classify a batch of slides in parallel and collect them into a pool.
///
/// Each slide's computation is independent and produces an immutable
/// record, so the batch fans out across a worker pool and joins into a
/// single result with no shared state.
pub fn classify_batch(slides: &[SlideImage], config: &ClassifierConfig) -> Result<SlidePool> {
    if slides.is_empty() {
        return Err(SlideError::NoUsableImages {
            reason: "no decoded slides to classify".to_string(),
        }
        .into());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.processing_threads)
        .build()
        .map_err(|e| SlideError::ClassificationFailed { reason: e.to_string() })?;

    let records: Vec<ImageRecord> = pool.install(|| {
        slides
            .par_iter()
            .map(|slide| {
                let (brightness, contrast, category) = classify_image(&slide.pixels, config);
                tracing::debug!(
                    "Slide '{}': brightness {:.1}, contrast {:.1} -> {:?}",
                    slide.id,
                    brightness,
                    contrast,
                    category
                );
                ImageRecord { id: slide.id.clone(), brightness, contrast, category }
            })
            .collect()
    });

    SlidePool::from_records(records)
}

/// Mean and standard deviation of per-pixel luminance (0-255 scale)
fn luminance_stats(pixels: &RgbImage) -> (f32, f32) {
    let count = (pixels.width() as u64 * pixels.height() as u64) as f64;
    if count == 0.0 {
        return (0.0, 0.0);
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;

    for pixel in pixels.pixels() {
        let luma = 0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
        sum += luma;
        sum_sq += luma * luma;
    }

    let mean = sum / count;
    let variance = (sum_sq / count - mean * mean).max(0.0);

    (mean as f32, variance.sqrt() as f32)
}
