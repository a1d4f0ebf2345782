//! # feature-crop
//!
//! Crops blog feature images to a fixed aspect ratio, keeping the part of the
//! picture that matters. Point it at a content directory: every `feature_*`
//! JPEG, PNG, WebP, TIFF, GIF or BMP gets a `feature_*_crop.*` sibling, by
//! default a 3:1 banner no wider than 2000 px.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Scan      content/   →  [SourceImage]    (filesystem → source list)
//! 2. Process   sources    →  *_crop.* files   (search + crop + encode)
//!                         →  ProcessReport    (console, optional JSON)
//! ```
//!
//! The crop search itself lives in [`imaging`] and never touches the
//! filesystem: it scores windows on a borrowed raster, so it is unit-tested
//! on images built in memory.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the content directory and selects source images |
//! | [`process`] | Stage 2: parallel per-image crop pipeline, progress events, report |
//! | [`imaging`] | Window geometry, region scoring, search, decode/encode backend |
//! | [`config`] | `feature-crop.toml` loading, merging, validation |
//! | [`naming`] | Output file naming and crop-variant detection |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Scoring
//!
//! A window's score blends three normalized signals: Shannon entropy of its
//! pixels (information), mean Sobel gradient of its luminance (structure) and
//! closeness of its center to the image center (composition). The weights
//! default to 0.2 / 0.4 / 0.4 and are configurable. See [`imaging::score`].
//!
//! ## Exhaustive, Deterministic Search
//!
//! A fixed-ratio crop always spans the full width or the full height of the
//! image, so the search space is one-dimensional per shape. Every offset at a
//! step of 2% of the free dimension is scored, plus the offset flush with the
//! trailing edge. Windows are scored in parallel, yet ties always resolve to
//! the first window in enumeration order, so the same image always gives the
//! same crop. See [`imaging::search`].
//!
//! ## Same Format In, Same Format Out
//!
//! Crops are written in their source's format. JPEG is progressive and its
//! quality steps down for large sources, which carry enough detail to hide
//! artifacts. WebP is lossy at the configured quality. An existing crop is
//! only replaced once the new one has been fully encoded.

pub mod config;
pub mod imaging;
pub mod logging;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
