//! Configuration module.
//!
//! Handles loading, validating, and merging `feature-crop.toml` files. Stock
//! defaults are overridden by a `feature-crop.toml` in the search root, which
//! in turn is overridden by a file passed with `--config`. Command-line flags
//! (`--aspect`, `--step`) are applied last by the binary.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [crop]
//! aspect_ratio = 3.0          # width / height of the crop
//! step_fraction = 0.02        # slide step, fraction of the free dimension
//! include_final_offset = true # always score the window at the trailing edge
//!
//! [weights]
//! entropy = 0.2               # information content
//! edge = 0.4                  # Sobel edge density
//! center = 0.4                # proximity to the image center
//!
//! [discovery]
//! prefix = "feature_"         # only files whose name starts with this
//! skip_marker = "crop"        # paths containing this are ignored
//!
//! [output]
//! suffix = "_crop"            # <stem><suffix>.<ext>
//! max_width = 2000            # wider crops are downscaled
//!
//! [encoding]
//! jpeg_quality_large = 85     # sources over 1000 KB
//! jpeg_quality_medium = 90    # sources over 500 KB
//! jpeg_quality_small = 95
//! webp_quality = 85
//! png_compression = "default" # fast | default | best
//!
//! [processing]
//! max_processes = 4           # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CropSettings, JpegQualityTiers, PngCompression, Quality, ScoringWeights, SearchOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the search root.
pub const CONFIG_FILE_NAME: &str = "feature-crop.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `feature-crop.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub crop: CropConfig,
    pub weights: ScoringWeights,
    pub discovery: DiscoveryConfig,
    pub output: OutputConfig,
    pub encoding: EncodingConfig,
    pub processing: ProcessingConfig,
}

/// Window search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Target `width / height`.
    pub aspect_ratio: f64,
    /// Slide step as a fraction of the free dimension, in `(0, 1]`.
    pub step_fraction: f64,
    /// Score the last feasible offset even when the stride skips it.
    pub include_final_offset: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 3.0,
            step_fraction: 0.02,
            include_final_offset: true,
        }
    }
}

/// Which files are picked up by a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Required file name prefix.
    pub prefix: String,
    /// Any path containing this (relative to the root) is skipped, so
    /// earlier outputs are never cropped again.
    pub skip_marker: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            prefix: "feature_".to_string(),
            skip_marker: "crop".to_string(),
        }
    }
}

/// Output naming and sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Appended to the source stem.
    pub suffix: String,
    /// Crops wider than this are downscaled with Lanczos3.
    pub max_width: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: "_crop".to_string(),
            max_width: 2000,
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub jpeg_quality_large: u32,
    pub jpeg_quality_medium: u32,
    pub jpeg_quality_small: u32,
    pub webp_quality: u32,
    pub png_compression: PngCompression,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            jpeg_quality_large: 85,
            jpeg_quality_medium: 90,
            jpeg_quality_small: 95,
            webp_quality: 85,
            png_compression: PngCompression::Default,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.clamp(1, cores)).unwrap_or(cores)
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let crop = &self.crop;
        if !crop.aspect_ratio.is_finite() || crop.aspect_ratio <= 0.0 {
            return Err(ConfigError::Validation(
                "crop.aspect_ratio must be a positive number".into(),
            ));
        }
        if !(crop.step_fraction > 0.0 && crop.step_fraction <= 1.0) {
            return Err(ConfigError::Validation(
                "crop.step_fraction must be in (0, 1]".into(),
            ));
        }
        if !self.weights.is_valid() {
            return Err(ConfigError::Validation(
                "weights must be non-negative and not all zero".into(),
            ));
        }
        if self.discovery.prefix.is_empty() {
            return Err(ConfigError::Validation(
                "discovery.prefix must not be empty".into(),
            ));
        }
        if self.output.suffix.is_empty() {
            return Err(ConfigError::Validation(
                "output.suffix must not be empty".into(),
            ));
        }
        if self.output.max_width == 0 {
            return Err(ConfigError::Validation(
                "output.max_width must be positive".into(),
            ));
        }
        let enc = &self.encoding;
        for (key, value) in [
            ("jpeg_quality_large", enc.jpeg_quality_large),
            ("jpeg_quality_medium", enc.jpeg_quality_medium),
            ("jpeg_quality_small", enc.jpeg_quality_small),
            ("webp_quality", enc.webp_quality),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "encoding.{key} must be 1-100"
                )));
            }
        }
        Ok(())
    }

    /// Resolve the per-image crop settings.
    pub fn crop_settings(&self) -> CropSettings {
        let enc = &self.encoding;
        CropSettings {
            aspect_ratio: self.crop.aspect_ratio,
            search: SearchOptions {
                step_fraction: self.crop.step_fraction,
                include_final_offset: self.crop.include_final_offset,
                weights: self.weights,
            },
            max_width: self.output.max_width,
            jpeg_quality: JpegQualityTiers {
                large: Quality::new(enc.jpeg_quality_large),
                medium: Quality::new(enc.jpeg_quality_medium),
                small: Quality::new(enc.jpeg_quality_small),
            },
            webp_quality: Quality::new(enc.webp_quality),
            png_compression: enc.png_compression,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist and `Err` if it exists but
/// is not valid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for a search root.
///
/// Layers, lowest first: stock defaults, `<root>/feature-crop.toml`, then
/// `explicit` (which must exist when given).
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let mut overlays = Vec::new();
    if let Some(root_layer) = load_raw_config(&root.join(CONFIG_FILE_NAME))? {
        overlays.push(root_layer);
    }
    if let Some(path) = explicit {
        let content = fs::read_to_string(path)?;
        overlays.push(toml::from_str(&content)?);
    }
    resolve_config(base, overlays)
}

/// Returns a fully-commented stock `feature-crop.toml` with all keys.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# feature-crop configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as feature-crop.toml in the directory you crop, or pass
# it with --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Crop search
# ---------------------------------------------------------------------------
[crop]
# Width divided by height of the crop. 3.0 gives a 3:1 banner.
aspect_ratio = 3.0

# Distance between tried windows, as a fraction of the image extent along
# the sliding axis. Smaller is slower and finer.
step_fraction = 0.02

# Also try the window flush with the bottom/right edge when the stride
# would skip it.
include_final_offset = true

# ---------------------------------------------------------------------------
# Scoring weights (need not sum to 1)
# ---------------------------------------------------------------------------
[weights]
# Information content of the window.
entropy = 0.2
# Density of edges and texture.
edge = 0.4
# Preference for windows near the image center.
center = 0.4

# ---------------------------------------------------------------------------
# Discovery
# ---------------------------------------------------------------------------
[discovery]
# Only files whose name starts with this are cropped.
prefix = "feature_"
# Paths containing this are skipped, so outputs are never re-cropped.
skip_marker = "crop"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# feature_a.jpg -> feature_a_crop.jpg
suffix = "_crop"
# Crops wider than this many pixels are downscaled (Lanczos3).
max_width = 2000

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# JPEG quality by source file size: > 1000 KB, > 500 KB, otherwise.
jpeg_quality_large = 85
jpeg_quality_medium = 90
jpeg_quality_small = 95
# Lossy WebP quality (1-100).
webp_quality = 85
# PNG compression effort: "fast", "default" or "best".
png_compression = "default"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Omit for auto (number of CPU cores).
# Values above the core count are clamped down.
# max_processes = 4
"##
}
