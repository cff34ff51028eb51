use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlideError};

/// Visual character of a slide, derived from its luminance statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// High mean luminance
    Bright,
    /// High luminance variance (busy diagrams, dense contrast)
    Dynamic,
    /// Everything else
    Calm,
}

impl Category {
    /// Pool fallback order used when a category has no members:
    /// CALM, then DYNAMIC, then BRIGHT.
    pub const FALLBACK_ORDER: [Category; 3] =
        [Category::Calm, Category::Dynamic, Category::Bright];

    fn index(self) -> usize {
        match self {
            Category::Bright => 0,
            Category::Dynamic => 1,
            Category::Calm => 2,
        }
    }
}

/// A decoded slide awaiting classification
#[derive(Debug, Clone)]
pub struct SlideImage {
    /// Stable identifier, usually the source file name
    pub id: String,

    /// Decoded pixel buffer
    pub pixels: RgbImage,
}

impl SlideImage {
    pub fn new<S: Into<String>>(id: S, pixels: RgbImage) -> Self {
        Self { id: id.into(), pixels }
    }
}

/// One classified slide. Immutable once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Stable identifier
    pub id: String,

    /// Mean pixel luminance, 0-255
    pub brightness: f32,

    /// Standard deviation of pixel luminance
    pub contrast: f32,

    /// Derived visual category
    pub category: Category,
}

/// The classified slide set, partitioned by category.
///
/// The category set is closed at three variants, so the partition is a
/// fixed three-armed index rather than an open mapping.
#[derive(Debug, Clone)]
pub struct SlidePool {
    records: Vec<ImageRecord>,
    by_category: [Vec<usize>; 3],
}

impl SlidePool {
    /// Build a pool from classified records.
    ///
    /// Fails with [`SlideError::NoUsableImages`] when the record set is
    /// empty: the planner needs at least one slide.
    pub fn from_records(records: Vec<ImageRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(SlideError::NoUsableImages {
                reason: "classified slide set is empty".to_string(),
            }
            .into());
        }

        let mut by_category: [Vec<usize>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for (index, record) in records.iter().enumerate() {
            by_category[record.category.index()].push(index);
        }

        Ok(Self { records, by_category })
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> &ImageRecord {
        &self.records[index]
    }

    /// Record indices belonging to a category, in input order
    pub fn members(&self, category: Category) -> &[usize] {
        &self.by_category[category.index()]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, category: Category) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            brightness: 100.0,
            contrast: 10.0,
            category,
        }
    }

    #[test]
    fn test_pool_partition() {
        let pool = SlidePool::from_records(vec![
            record("a", Category::Calm),
            record("b", Category::Bright),
            record("c", Category::Calm),
        ])
        .unwrap();

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.members(Category::Calm), &[0, 2]);
        assert_eq!(pool.members(Category::Bright), &[1]);
        assert!(pool.members(Category::Dynamic).is_empty());
    }

    #[test]
    fn test_empty_pool_rejected() {
        let result = SlidePool::from_records(vec![]);
        assert!(matches!(
            result,
            Err(crate::error::SyncError::Slide(SlideError::NoUsableImages { .. }))
        ));
    }
}
