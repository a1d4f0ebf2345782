//! Filesystem scanning.
//!
//! Stage 1 of the crop pipeline. Walks a directory tree and collects every
//! source image that should get a feature crop.
//!
//! ## Selection Rules
//!
//! ```text
//! content/
//! ├── feature-crop.toml
//! ├── posts/
//! │   ├── feature_sunrise.jpg        # picked up
//! │   ├── feature_sunrise_crop.jpg   # skipped: contains the skip marker
//! │   ├── inline_chart.png           # skipped: no prefix
//! │   └── feature_notes.md           # skipped: not an image
//! └── cropped/
//!     └── feature_old.jpg            # skipped: marker in the directory name
//! ```
//!
//! - The file name must start with the configured prefix.
//! - The extension must be one the backend can decode and encode
//!   (case-insensitive).
//! - The path below the root must not contain the skip marker.
//!
//! Entries are visited sorted by file name, so the result is deterministic.

use crate::config::DiscoveryConfig;
use crate::imaging::supported_input_extensions;
use crate::naming::{has_prefix, is_crop_variant};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Search root not found: {0}")]
    RootNotFound(PathBuf),
}

/// A discovered source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceImage {
    pub path: PathBuf,
    /// Path below the search root, used for display and skip matching.
    pub relative_path: PathBuf,
    pub size_bytes: u64,
}

/// Walk `root` and collect every image matching `discovery`.
pub fn scan(root: &Path, discovery: &DiscoveryConfig) -> Result<Vec<SourceImage>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative_path = path.strip_prefix(root).unwrap_or(path);

        if !has_prefix(path, &discovery.prefix) || !is_supported_image(path) {
            continue;
        }
        if is_crop_variant(relative_path, &discovery.skip_marker) {
            tracing::debug!(path = %relative_path.display(), "skipping crop variant");
            continue;
        }

        images.push(SourceImage {
            path: path.to_path_buf(),
            relative_path: relative_path.to_path_buf(),
            size_bytes: entry.metadata()?.len(),
        });
    }

    tracing::info!(root = %root.display(), found = images.len(), "scan complete");
    Ok(images)
}

fn is_supported_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, bytes: usize) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; bytes]).unwrap();
    }

    fn relative_paths(images: &[SourceImage]) -> Vec<String> {
        images
            .iter()
            .map(|i| i.relative_path.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(root, "posts/feature_sunrise.jpg", 10);
        touch(root, "posts/feature_sunrise_crop.jpg", 10);
        touch(root, "posts/inline_chart.png", 10);
        touch(root, "posts/feature_notes.md", 10);
        touch(root, "posts/b/feature_zebra.PNG", 20);
        touch(root, "posts/a/feature_alpha.webp", 30);
        touch(root, "cropped/feature_old.jpg", 10);
        touch(root, "feature_root.TIFF", 40);
        touch(root, "feature_logo.svg", 10);
        tmp
    }

    #[test]
    fn scan_applies_selection_rules() {
        let tmp = setup();
        let images = scan(tmp.path(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(
            relative_paths(&images),
            vec![
                "feature_root.TIFF",
                "posts/a/feature_alpha.webp",
                "posts/b/feature_zebra.PNG",
                "posts/feature_sunrise.jpg",
            ]
        );
    }

    #[test]
    fn scan_records_absolute_path_and_size() {
        let tmp = setup();
        let images = scan(tmp.path(), &DiscoveryConfig::default()).unwrap();
        let alpha = images
            .iter()
            .find(|i| i.relative_path.ends_with("feature_alpha.webp"))
            .unwrap();
        assert_eq!(alpha.path, tmp.path().join("posts/a/feature_alpha.webp"));
        assert_eq!(alpha.size_bytes, 30);
    }

    #[test]
    fn scan_respects_custom_prefix_and_marker() {
        let tmp = setup();
        touch(tmp.path(), "hero_banner.jpg", 10);
        touch(tmp.path(), "hero_banner_wide.jpg", 10);
        let discovery = DiscoveryConfig {
            prefix: "hero_".into(),
            skip_marker: "_wide".into(),
        };
        let images = scan(tmp.path(), &discovery).unwrap();
        assert_eq!(relative_paths(&images), vec!["hero_banner.jpg"]);
    }

    #[test]
    fn marker_in_root_path_does_not_hide_sources() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("crop-jobs");
        touch(&root, "feature_a.jpg", 10);
        let images = scan(&root, &DiscoveryConfig::default()).unwrap();
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(tmp.path(), &DiscoveryConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = scan(&tmp.path().join("missing"), &DiscoveryConfig::default());
        assert!(matches!(result, Err(ScanError::RootNotFound(_))));
    }
}
