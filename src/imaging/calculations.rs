//! Pure calculation functions for crop output sizes and file sizes.
//!
//! All functions here are pure and testable without any I/O or images.

use super::geometry::Rect;
use super::params::{JpegQualityTiers, Quality};

/// Source size (KB) above which the large-file JPEG quality applies.
pub const LARGE_SOURCE_KB: f64 = 1000.0;
/// Source size (KB) above which the medium-file JPEG quality applies.
pub const MEDIUM_SOURCE_KB: f64 = 500.0;

/// Calculate the written size of a crop, capping its width at `max_width`.
///
/// Crops at or below the cap keep their size. Wider crops are scaled to
/// `max_width` and the height follows proportionally, truncated:
///
/// ```
/// # use feature_crop::imaging::{Rect, calculate_output_dimensions};
/// let crop = Rect::new(0, 0, 3000, 1000).unwrap();
/// assert_eq!(calculate_output_dimensions(crop, 2000), (2000, 666));
/// ```
pub fn calculate_output_dimensions(crop: Rect, max_width: u32) -> (u32, u32) {
    let (w, h) = (crop.width(), crop.height());
    if w <= max_width {
        return (w, h);
    }
    let height = (h as u64 * max_width as u64 / w as u64) as u32;
    (max_width, height.max(1))
}

/// Pick the JPEG quality for a source of `source_kb` kilobytes.
pub fn select_jpeg_quality(source_kb: f64, tiers: &JpegQualityTiers) -> Quality {
    if source_kb > LARGE_SOURCE_KB {
        tiers.large
    } else if source_kb > MEDIUM_SOURCE_KB {
        tiers.medium
    } else {
        tiers.small
    }
}

pub fn bytes_to_kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

/// Size reduction as a percentage of the original: `(orig - new) / orig × 100`.
///
/// Negative when the output grew. An empty original reports 0.
pub fn compression_ratio(original_kb: f64, new_kb: f64) -> f64 {
    if original_kb <= 0.0 {
        return 0.0;
    }
    (original_kb - new_kb) / original_kb * 100.0
}
