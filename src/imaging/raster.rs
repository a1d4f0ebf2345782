//! Borrowed pixel views over decoded images.
//!
//! The search never copies pixels: [`Raster`] borrows the decoded buffer and
//! [`RasterView`] borrows a rectangular window of it. Both are `Copy` and
//! `Sync`, so candidate windows can be scored from any rayon worker.
//!
//! Only 8-bit gray (1 channel) and RGB (3 channel) layouts are supported.
//! [`PixelBuffer::from_dynamic`] normalizes every decoded image into one of
//! the two.

use super::geometry::Rect;
use image::{DynamicImage, GrayImage, RgbImage, imageops};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("unsupported channel count {0} (expected 1 or 3)")]
    UnsupportedChannels(usize),
    #[error("pixel buffer holds {actual} bytes, {width}x{height}x{channels} needs {expected}")]
    BufferSize {
        width: u32,
        height: u32,
        channels: usize,
        expected: usize,
        actual: usize,
    },
}

/// Immutable, row-major, interleaved 8-bit image.
#[derive(Debug, Clone, Copy)]
pub struct Raster<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    channels: usize,
}

impl<'a> Raster<'a> {
    /// Wrap a raw buffer. Zero-sized rasters are allowed; they produce empty
    /// views.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        channels: usize,
    ) -> Result<Self, RasterError> {
        if channels != 1 && channels != 3 {
            return Err(RasterError::UnsupportedChannels(channels));
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn full_view(&self) -> RasterView<'a> {
        RasterView {
            data: self.data,
            stride: self.width as usize * self.channels,
            left: 0,
            top: 0,
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    /// Borrow the part of `rect` that overlaps the raster.
    ///
    /// A rectangle reaching past the edge is clipped; one entirely outside
    /// yields an empty view rather than an error.
    pub fn view(&self, rect: Rect) -> RasterView<'a> {
        let left = rect.left.min(self.width);
        let top = rect.top.min(self.height);
        let right = rect.right.min(self.width);
        let bottom = rect.bottom.min(self.height);
        RasterView {
            data: self.data,
            stride: self.width as usize * self.channels,
            left,
            top,
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
            channels: self.channels,
        }
    }
}

/// Rectangular window into a [`Raster`].
#[derive(Debug, Clone, Copy)]
pub struct RasterView<'a> {
    data: &'a [u8],
    stride: usize,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    channels: usize,
}

impl<'a> RasterView<'a> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// Interleaved samples of row `y` (relative to the view), `width × channels`
    /// bytes long.
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = (self.top + y) as usize * self.stride + self.left as usize * self.channels;
        &self.data[start..start + self.width as usize * self.channels]
    }

    /// Iterate over the rows of the view, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }
}

/// Owned decode result in one of the two layouts the scorer understands.
#[derive(Debug, Clone)]
pub enum PixelBuffer {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl PixelBuffer {
    /// 8-bit gray images are kept as-is; every other color type (alpha,
    /// 16-bit, float) is converted to 8-bit RGB.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma8(gray) => Self::Gray(gray),
            DynamicImage::ImageRgb8(rgb) => Self::Rgb(rgb),
            other => Self::Rgb(other.to_rgb8()),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Gray(img) => img.dimensions(),
            Self::Rgb(img) => img.dimensions(),
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Self::Gray(_) => 1,
            Self::Rgb(_) => 3,
        }
    }

    pub fn raster(&self) -> Raster<'_> {
        let (width, height) = self.dimensions();
        let data: &[u8] = match self {
            Self::Gray(img) => img.as_raw(),
            Self::Rgb(img) => img.as_raw(),
        };
        // ImageBuffer guarantees len == width * height * channels
        Raster {
            data,
            width,
            height,
            channels: self.channels(),
        }
    }

    /// Copy `rect` out into a standalone image for encoding.
    pub fn crop(&self, rect: Rect) -> DynamicImage {
        let (x, y, w, h) = (rect.left, rect.top, rect.width(), rect.height());
        match self {
            Self::Gray(img) => DynamicImage::ImageLuma8(imageops::crop_imm(img, x, y, w, h).to_image()),
            Self::Rgb(img) => DynamicImage::ImageRgb8(imageops::crop_imm(img, x, y, w, h).to_image()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn ramp(width: u32, height: u32) -> Vec<u8> {
        (0..width * height).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn new_rejects_unsupported_channels() {
        let data = vec![0u8; 8];
        assert_eq!(
            Raster::new(&data, 2, 2, 2).unwrap_err(),
            RasterError::UnsupportedChannels(2)
        );
    }

    #[test]
    fn new_rejects_mismatched_buffer() {
        let data = vec![0u8; 10];
        assert!(matches!(
            Raster::new(&data, 2, 2, 3),
            Err(RasterError::BufferSize {
                expected: 12,
                actual: 10,
                ..
            })
        ));
    }

    #[test]
    fn view_rows_borrow_the_right_bytes() {
        let data = ramp(4, 3);
        let raster = Raster::new(&data, 4, 3, 1).unwrap();
        let view = raster.view(Rect::new(1, 1, 3, 3).unwrap());
        assert_eq!(view.width(), 2);
        assert_eq!(view.height(), 2);
        assert_eq!(view.row(0), &[5, 6]);
        assert_eq!(view.row(1), &[9, 10]);
    }

    #[test]
    fn view_rows_are_interleaved_for_rgb() {
        let data: Vec<u8> = (0..2 * 2 * 3).map(|i| i as u8).collect();
        let raster = Raster::new(&data, 2, 2, 3).unwrap();
        let view = raster.view(Rect::new(1, 0, 2, 2).unwrap());
        let rows: Vec<&[u8]> = view.rows().collect();
        assert_eq!(rows, vec![&[3u8, 4, 5][..], &[9u8, 10, 11][..]]);
    }

    #[test]
    fn view_clips_to_raster_bounds() {
        let data = ramp(4, 4);
        let raster = Raster::new(&data, 4, 4, 1).unwrap();
        let clipped = raster.view(Rect::new(2, 2, 10, 10).unwrap());
        assert_eq!((clipped.width(), clipped.height()), (2, 2));

        let outside = raster.view(Rect::new(5, 5, 9, 9).unwrap());
        assert!(outside.is_empty());
    }

    #[test]
    fn zero_sized_raster_has_empty_full_view() {
        let raster = Raster::new(&[], 0, 0, 3).unwrap();
        assert!(raster.full_view().is_empty());
    }

    #[test]
    fn from_dynamic_keeps_gray_and_flattens_alpha() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([7])));
        let buffer = PixelBuffer::from_dynamic(gray);
        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.dimensions(), (3, 2));

        let rgba = DynamicImage::new_rgba8(5, 4);
        let buffer = PixelBuffer::from_dynamic(rgba);
        assert_eq!(buffer.channels(), 3);
        assert_eq!(buffer.raster().full_view().row(0).len(), 15);
    }

    #[test]
    fn crop_copies_the_requested_region() {
        let img = RgbImage::from_fn(6, 4, |x, y| Rgb([x as u8, y as u8, 0]));
        let buffer = PixelBuffer::Rgb(img);
        let cropped = buffer.crop(Rect::new(2, 1, 5, 3).unwrap()).to_rgb8();
        assert_eq!(cropped.dimensions(), (3, 2));
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([2, 1, 0]));
        assert_eq!(cropped.get_pixel(2, 1), &Rgb([4, 2, 0]));
    }
}
