//! Image processing: crop search plus pure-Rust decode and encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Decode** | `image::ImageReader`, normalized to gray or RGB8 |
//! | **Score** | entropy + Sobel edges + center proximity ([`score`]) |
//! | **Search** | sliding windows scored on the rayon pool ([`search`]) |
//! | **Crop → encode** | `crop_imm` + Lanczos3 + per-format encoders |
//!
//! The module is split into:
//! - **Geometry**: window sizes and offsets (pure arithmetic)
//! - **Raster**: borrowed pixel views over decoded buffers
//! - **Score / Search**: the crop selection algorithm
//! - **Calculations**: output size and file size math (unit testable)
//! - **Parameters**: data structures describing what to write
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: high-level functions combining search + backend

pub mod backend;
mod calculations;
pub mod geometry;
pub mod operations;
mod params;
pub mod raster;
pub mod rust_backend;
pub mod score;
pub mod search;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{bytes_to_kb, calculate_output_dimensions, compression_ratio};
pub use geometry::{Rect, SlideMode};
pub use operations::{
    CropError, CropOutcome, CropSettings, choose_crop, crop_to_aspect, get_dimensions,
};
pub use params::{
    CropParams, EncodeParams, JpegQualityTiers, OutputFormat, PngCompression, Quality,
};
pub use raster::{PixelBuffer, Raster, RasterError, RasterView};
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use score::{ScoringWeights, score_region};
pub use search::{CropChoice, SearchError, SearchOptions, find_best_crop};
