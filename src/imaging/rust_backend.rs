//! Image processing backend built on the `image` crate.
//!
//! Decoding, cropping and resizing are pure Rust. Two encoders come from
//! outside `image`: `jpeg-encoder` for progressive JPEG and libwebp (through
//! the `webp` crate) for lossy WebP.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` with format sniffing |
//! | Crop | `image::imageops::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `jpeg_encoder::Encoder`, progressive, optimized Huffman tables |
//! | Encode → PNG | `PngEncoder::new_with_quality`, adaptive filtering |
//! | Encode → WebP | `webp::Encoder::encode_simple`, lossy |
//! | Encode → TIFF, GIF, BMP | `image` encoders |
//!
//! Output is encoded in memory, written to a hidden sibling file and renamed
//! over the destination, so a failed encode never clobbers an existing crop.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{CropParams, EncodeParams, PngCompression};
use super::raster::PixelBuffer;
use image::codecs::png::{self, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && fmt.writing_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the image file extensions that can be both decoded and re-encoded.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn encode_error(encode: EncodeParams, err: impl std::fmt::Display) -> BackendError {
    BackendError::ProcessingFailed(format!("{:?} encode failed: {err}", encode.format()))
}

fn png_compression(level: PngCompression) -> png::CompressionType {
    match level {
        PngCompression::Fast => png::CompressionType::Fast,
        PngCompression::Default => png::CompressionType::Default,
        PngCompression::Best => png::CompressionType::Best,
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let (width, height) = match (u16::try_from(img.width()), u16::try_from(img.height())) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(format!(
                "{}x{} exceeds the 65535 px JPEG limit",
                img.width(),
                img.height()
            ));
        }
    };

    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, quality);
    encoder.set_progressive(true);
    encoder.set_optimized_huffman_tables(true);
    let result = match img {
        DynamicImage::ImageLuma8(gray) => {
            encoder.encode(gray.as_raw(), width, height, jpeg_encoder::ColorType::Luma)
        }
        other => encoder.encode(
            other.to_rgb8().as_raw(),
            width,
            height,
            jpeg_encoder::ColorType::Rgb,
        ),
    };
    result.map_err(|e| e.to_string())?;
    Ok(out)
}

fn encode_webp(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, String> {
    let rgb = img.to_rgb8();
    let memory = webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
        .encode_simple(false, quality)
        .map_err(|e| format!("libwebp: {e:?}"))?;
    Ok(memory.to_vec())
}

/// Encode `img` in memory with the requested settings.
fn encode_image(img: &DynamicImage, encode: EncodeParams) -> Result<Vec<u8>, BackendError> {
    let mut cursor = Cursor::new(Vec::new());
    let result = match encode {
        // Quality is clamped to 1..=100, so it fits in a u8
        EncodeParams::Jpeg { quality } => {
            return encode_jpeg(img, quality.value() as u8).map_err(|e| encode_error(encode, e));
        }
        EncodeParams::WebP { quality } => {
            return encode_webp(img, quality.value() as f32).map_err(|e| encode_error(encode, e));
        }
        EncodeParams::Png { compression } => img.write_with_encoder(PngEncoder::new_with_quality(
            &mut cursor,
            png_compression(compression),
            png::FilterType::Adaptive,
        )),
        EncodeParams::Tiff => img.write_with_encoder(TiffEncoder::new(&mut cursor)),
        // GIF frames are RGBA
        EncodeParams::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut cursor, ImageFormat::Gif)
        }
        EncodeParams::Bmp => img.write_to(&mut cursor, ImageFormat::Bmp),
    };
    result.map_err(|e| encode_error(encode, e))?;
    Ok(cursor.into_inner())
}

/// Replace `path` with `bytes` through a rename, so readers never see a
/// partial file and a failed write leaves the old file in place.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    let file_name = path.file_name().ok_or_else(|| {
        BackendError::ProcessingFailed(format!("output {} has no file name", path.display()))
    })?;
    let staging = path.with_file_name(format!(".{}.partial", file_name.to_string_lossy()));

    std::fs::write(&staging, bytes)?;
    if let Err(e) = std::fs::rename(&staging, path) {
        std::fs::remove_file(&staging).ok();
        return Err(e.into());
    }
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn load(&self, path: &Path) -> Result<PixelBuffer, BackendError> {
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_error(path, e))?;
        Ok(PixelBuffer::from_dynamic(img))
    }

    fn write_crop(&self, image: &PixelBuffer, params: &CropParams) -> Result<u64, BackendError> {
        let (width, height) = image.dimensions();
        if !params.rect.fits_within(width, height) {
            return Err(BackendError::ProcessingFailed(format!(
                "crop {:?} exceeds {width}x{height} source {}",
                params.rect,
                params.source.display()
            )));
        }

        let cropped = image.crop(params.rect);
        let output = if params.needs_resize() {
            cropped.resize_exact(params.output_width, params.output_height, FilterType::Lanczos3)
        } else {
            cropped
        };

        let bytes = encode_image(&output, params.encode)?;
        write_replacing(&params.output, &bytes)?;
        Ok(bytes.len() as u64)
    }
}
