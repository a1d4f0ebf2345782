//! Shared test utilities: synthetic images built in memory.
//!
//! Every builder is deterministic, so search results on them are stable
//! across runs.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let busy_top = checker_patch(200, 600, (10, 10, 190, 190));
//! let choice = find_best_crop(&busy_top.raster(), 1.0, &SearchOptions::default()).unwrap();
//! assert!(choice.rect.top < 190);
//! ```

use crate::imaging::PixelBuffer;
use image::{GrayImage, Luma, Rgb, RgbImage};

/// Background level around a [`checker_patch`].
pub const PATCH_BACKGROUND: u8 = 128;

/// Side length of one checker square.
pub const CHECKER_CELL: u32 = 8;

/// Smooth RGB ramp: red follows x, green follows y, blue is constant.
///
/// Low edge energy and moderate entropy everywhere, with no region standing
/// out, so center proximity tends to decide.
pub fn gradient_rgb(width: u32, height: u32) -> PixelBuffer {
    let (w, h) = (width.max(1), height.max(1));
    PixelBuffer::Rgb(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / w) as u8, (y * 255 / h) as u8, 128])
    }))
}

/// Single-level gray image: zero entropy and zero edges.
pub fn uniform_gray(width: u32, height: u32, level: u8) -> PixelBuffer {
    PixelBuffer::Gray(GrayImage::from_pixel(width, height, Luma([level])))
}

/// Flat gray image with a black-and-white checkerboard filling
/// `(left, top, right, bottom)` (right and bottom exclusive).
pub fn checker_patch(width: u32, height: u32, patch: (u32, u32, u32, u32)) -> PixelBuffer {
    let (left, top, right, bottom) = patch;
    PixelBuffer::Gray(GrayImage::from_fn(width, height, |x, y| {
        if (left..right).contains(&x) && (top..bottom).contains(&y) {
            let on = ((x - left) / CHECKER_CELL + (y - top) / CHECKER_CELL) % 2 == 0;
            Luma([if on { 255 } else { 0 }])
        } else {
            Luma([PATCH_BACKGROUND])
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_patch_stays_inside_its_rect() {
        let PixelBuffer::Gray(img) = checker_patch(40, 40, (8, 8, 24, 24)) else {
            panic!("expected gray buffer");
        };
        assert_eq!(img.get_pixel(0, 0).0, [PATCH_BACKGROUND]);
        assert_eq!(img.get_pixel(8, 8).0, [255]);
        assert_eq!(img.get_pixel(16, 8).0, [0]);
        assert_eq!(img.get_pixel(24, 24).0, [PATCH_BACKGROUND]);
    }

    #[test]
    fn builders_have_requested_size() {
        assert_eq!(gradient_rgb(30, 20).dimensions(), (30, 20));
        assert_eq!(uniform_gray(5, 7, 1).dimensions(), (5, 7));
    }
}
