use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, SlideError};
use crate::slides::types::SlideImage;

/// Slide image loader.
///
/// Discovers `jpg`/`jpeg`/`png` files in a directory, sorted by file name
/// so numbered exports keep their deck order, and decodes them with the
/// `image` crate.
pub struct SlideLoader;

impl SlideLoader {
    /// Load every readable slide in a directory.
    ///
    /// A slide that fails to decode is logged and dropped; the batch only
    /// fails when nothing usable remains ([`SlideError::NoUsableImages`]).
    pub async fn load_directory<P: AsRef<Path>>(dir: P) -> Result<Vec<SlideImage>> {
        let dir = dir.as_ref();

        if !dir.is_dir() {
            return Err(SlideError::NoUsableImages {
                reason: format!("slides directory not found: {}", dir.display()),
            }
            .into());
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if Self::is_slide_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(SlideError::NoUsableImages {
                reason: format!("no slide images in {}", dir.display()),
            }
            .into());
        }

        let total = paths.len();
        let mut slides = Vec::with_capacity(total);
        let mut failed = 0usize;

        for path in paths {
            match Self::decode(&path) {
                Ok(slide) => {
                    debug!("Loaded slide '{}' ({}x{})", slide.id, slide.pixels.width(), slide.pixels.height());
                    slides.push(slide);
                }
                Err(error) => {
                    // Single-slide decode failures are recovered here and
                    // never propagate item-wise past this boundary.
                    warn!("Skipping unreadable slide: {}", error);
                    failed += 1;
                }
            }
        }

        if slides.is_empty() {
            return Err(SlideError::NoUsableImages {
                reason: format!("all {} slide images failed to decode", total),
            }
            .into());
        }

        if failed > 0 {
            warn!("Excluded {}/{} slides from the pool", failed, total);
        }

        Ok(slides)
    }

    /// Decode a single slide, mapping any failure to [`SlideError::ImageDecode`]
    pub fn decode(path: &Path) -> Result<SlideImage> {
        let pixels = image::open(path)
            .map_err(|_| SlideError::ImageDecode { path: path.display().to_string() })?
            .to_rgb8();

        let id = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("slide")
            .to_string();

        Ok(SlideImage::new(id, pixels))
    }

    fn is_slide_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png"))
            .unwrap_or(false)
    }
}
