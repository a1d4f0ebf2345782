//! High-level image operations.
//!
//! These functions combine the window search and the size calculations with
//! backend execution: load through the backend, search on borrowed pixels,
//! plan the output, write through the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_output_dimensions, select_jpeg_quality};
use super::geometry::Rect;
use super::params::{
    CropParams, EncodeParams, JpegQualityTiers, OutputFormat, PngCompression, Quality,
};
use super::raster::PixelBuffer;
use super::search::{CropChoice, SearchError, SearchOptions, find_best_crop};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("unsupported output format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Result type for crop operations.
pub type Result<T> = std::result::Result<T, CropError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Everything needed to crop one image, resolved from config and CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct CropSettings {
    /// Target `width / height`.
    pub aspect_ratio: f64,
    pub search: SearchOptions,
    /// Crops wider than this are downscaled.
    pub max_width: u32,
    pub jpeg_quality: JpegQualityTiers,
    pub webp_quality: Quality,
    pub png_compression: PngCompression,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: 3.0,
            search: SearchOptions::default(),
            max_width: 2000,
            jpeg_quality: JpegQualityTiers::default(),
            webp_quality: Quality::new(85),
            png_compression: PngCompression::Default,
        }
    }
}

/// A crop that was searched for and, unless planning only, written.
#[derive(Debug, Clone, PartialEq)]
pub struct CropOutcome {
    /// Decoded size of the source image.
    pub source_dimensions: (u32, u32),
    pub choice: CropChoice,
    pub params: CropParams,
    /// Size of the written file; `None` when nothing was written.
    pub written_bytes: Option<u64>,
}

/// Pick encoder settings for `format` given the source size in KB.
pub fn encode_params_for(format: OutputFormat, source_kb: f64, settings: &CropSettings) -> EncodeParams {
    match format {
        OutputFormat::Jpeg => EncodeParams::Jpeg {
            quality: select_jpeg_quality(source_kb, &settings.jpeg_quality),
        },
        OutputFormat::Png => EncodeParams::Png {
            compression: settings.png_compression,
        },
        OutputFormat::WebP => EncodeParams::WebP {
            quality: settings.webp_quality,
        },
        OutputFormat::Tiff => EncodeParams::Tiff,
        OutputFormat::Gif => EncodeParams::Gif,
        OutputFormat::Bmp => EncodeParams::Bmp,
    }
}

/// Plan writing `rect` from `source` to `output` without executing it.
///
/// The output format follows the output extension.
pub fn plan_crop(
    source: &Path,
    output: &Path,
    rect: Rect,
    source_kb: f64,
    settings: &CropSettings,
) -> Result<CropParams> {
    let format = OutputFormat::from_path(output)
        .ok_or_else(|| CropError::UnsupportedFormat(output.to_path_buf()))?;
    let (output_width, output_height) = calculate_output_dimensions(rect, settings.max_width);

    Ok(CropParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        rect,
        output_width,
        output_height,
        encode: encode_params_for(format, source_kb, settings),
    })
}

/// Decode `source` and find its best crop. Returns the decoded pixels so the
/// caller can write the crop without decoding twice.
pub fn choose_crop(
    backend: &impl ImageBackend,
    source: &Path,
    settings: &CropSettings,
) -> Result<(PixelBuffer, CropChoice)> {
    let buffer = backend.load(source)?;
    let choice = find_best_crop(&buffer.raster(), settings.aspect_ratio, &settings.search)?;
    Ok((buffer, choice))
}

/// Search `source` for its best crop and write it to `output`.
///
/// With `dry_run` the crop is planned but not written.
pub fn crop_to_aspect(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    source_kb: f64,
    settings: &CropSettings,
    dry_run: bool,
) -> Result<CropOutcome> {
    // Fail on an unwritable format before paying for the decode
    if OutputFormat::from_path(output).is_none() {
        return Err(CropError::UnsupportedFormat(output.to_path_buf()));
    }

    let (buffer, choice) = choose_crop(backend, source, settings)?;
    let params = plan_crop(source, output, choice.rect, source_kb, settings)?;

    let written_bytes = if dry_run {
        None
    } else {
        Some(backend.write_crop(&buffer, &params)?)
    };

    Ok(CropOutcome {
        source_dimensions: buffer.dimensions(),
        choice,
        params,
        written_bytes,
    })
}
