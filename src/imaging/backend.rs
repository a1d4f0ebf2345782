//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, load, and write_crop. Everything between load and write
//! (the window search) works on borrowed pixels and never touches a backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's pure-Rust codecs.

use super::params::CropParams;
use super::raster::PixelBuffer;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can serve every rayon worker in the batch stage.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an image into a layout the scorer understands.
    fn load(&self, path: &Path) -> Result<PixelBuffer, BackendError>;

    /// Cut `params.rect` out of `image`, scale it to the output size, encode
    /// it and write it to `params.output`. Returns the bytes written.
    fn write_crop(&self, image: &PixelBuffer, params: &CropParams) -> Result<u64, BackendError>;
}
