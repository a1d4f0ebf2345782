//! Parameter types for image operations.
//!
//! These structs describe *what* to write, not *how*. They are the interface
//! between [`operations`](super::operations), which decides the crop and the
//! encoder settings, and the [`backend`](super::backend), which does the pixel
//! work. A mock backend can record them without touching the filesystem.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`OutputFormat`]: container to encode into, taken from the source extension.
//! - [`PngCompression`]: zlib effort for PNG output.
//! - [`JpegQualityTiers`]: JPEG quality picked by source file size.
//! - [`EncodeParams`]: format plus the settings that format uses.
//! - [`CropParams`]: full specification for writing one crop.

use super::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Output container. Crops are always written in the source's format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
    Gif,
    Bmp,
}

impl OutputFormat {
    /// Map a file extension (case-insensitive) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "tif" | "tiff" => Some(Self::Tiff),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// PNG compression effort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

/// JPEG quality tiers keyed on the source file size.
///
/// Large sources already carry a lot of detail, so they tolerate a lower
/// quality; small ones get a higher setting to avoid visible artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegQualityTiers {
    /// Used when the source is larger than 1000 KB.
    pub large: Quality,
    /// Used when the source is larger than 500 KB.
    pub medium: Quality,
    pub small: Quality,
}

impl Default for JpegQualityTiers {
    fn default() -> Self {
        Self {
            large: Quality::new(85),
            medium: Quality::new(90),
            small: Quality::new(95),
        }
    }
}

/// Encoder settings for one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeParams {
    /// Progressive, with optimized Huffman tables.
    Jpeg { quality: Quality },
    Png { compression: PngCompression },
    /// Lossy.
    WebP { quality: Quality },
    Tiff,
    /// Single frame, palette quantized by the encoder.
    Gif,
    Bmp,
}

impl EncodeParams {
    pub fn format(&self) -> OutputFormat {
        match self {
            Self::Jpeg { .. } => OutputFormat::Jpeg,
            Self::Png { .. } => OutputFormat::Png,
            Self::WebP { .. } => OutputFormat::WebP,
            Self::Tiff => OutputFormat::Tiff,
            Self::Gif => OutputFormat::Gif,
            Self::Bmp => OutputFormat::Bmp,
        }
    }
}

/// Parameters for writing one crop: the region to cut from the decoded
/// source, the size to scale it to, and how to encode it.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rect: Rect,
    /// Final dimensions; equal to the rect size unless the crop was downscaled.
    pub output_width: u32,
    pub output_height: u32,
    pub encode: EncodeParams,
}

impl CropParams {
    pub fn needs_resize(&self) -> bool {
        (self.output_width, self.output_height) != (self.rect.width(), self.rect.height())
    }
}
