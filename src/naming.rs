//! Centralized filename rules for sources and their crops.
//!
//! A source `feature_sunrise.jpg` is written next to itself as
//! `feature_sunrise_crop.jpg`: same directory, same extension, the configured
//! suffix appended to the stem. The suffix contains the skip marker, so the
//! output is never discovered as a source on the next run.

use std::path::{Path, PathBuf};

/// Build the output path for `source`: `<dir>/<stem><suffix>.<ext>`.
///
/// The original extension (and its case) is preserved. A source without an
/// extension gets none.
pub fn output_path_for(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let name = match source.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    source.with_file_name(name)
}

/// True if the file name starts with `prefix`.
pub fn has_prefix(path: &Path, prefix: &str) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with(prefix))
}

/// True if `relative_path` contains `marker` anywhere.
///
/// Matching is on the path below the search root, so a root directory that
/// happens to contain the marker does not hide everything under it.
pub fn is_crop_variant(relative_path: &Path, marker: &str) -> bool {
    !marker.is_empty() && relative_path.to_string_lossy().contains(marker)
}
