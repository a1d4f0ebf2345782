//! Batch cropping.
//!
//! Stage 2 of the crop pipeline. Takes the source list from the scan stage
//! and, for each image, finds the best crop and writes it next to the source.
//!
//! ## Per-image steps
//!
//! ```text
//! feature_sunrise.jpg (1.8 MB, 4000x3000)
//!   decode       → RGB8 raster
//!   search       → 4000x1333 at top=912, score 0.713
//!   resize       → 2000x666 (Lanczos3, max_width)
//!   encode       → JPEG q85 (source over 1000 KB)
//!   write        → feature_sunrise_crop.jpg
//! ```
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel on the rayon pool; each image's window
//! search uses the same pool. Results are collected in scan order, so the
//! report is stable regardless of scheduling.
//!
//! ## Failure isolation
//!
//! A failure in one image (corrupt file, infeasible geometry, write error)
//! is reported as a [`ProcessEvent::ImageFailed`] and recorded in the report;
//! the rest of the batch carries on.

use crate::config::Config;
use crate::imaging::{
    CropError, CropSettings, ImageBackend, Rect, RustBackend, SlideMode, bytes_to_kb,
    compression_ratio, crop_to_aspect,
};
use crate::naming::output_path_for;
use crate::scan::SourceImage;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Progress events emitted while the batch runs.
///
/// Sent through an optional channel so the binary can print progress as it
/// happens while library callers stay silent.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        total: usize,
        dry_run: bool,
    },
    /// The output already exists and is about to be replaced.
    Overwriting {
        index: usize,
        output_path: String,
    },
    ImageCropped(ImageReport),
    ImageFailed {
        index: usize,
        source_path: String,
        error: String,
    },
}

/// Outcome for one successfully searched image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageReport {
    /// 1-based position in scan order.
    pub index: usize,
    /// Source path relative to the search root.
    pub source_path: String,
    pub output_path: String,
    pub source_dimensions: (u32, u32),
    pub rect: Rect,
    pub score: f64,
    pub mode: SlideMode,
    pub candidates: usize,
    /// Written size; differs from the rect when the crop was downscaled.
    pub output_dimensions: (u32, u32),
    pub original_kb: f64,
    /// `None` in dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_kb: Option<f64>,
    /// Size reduction in percent; `None` in dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedImage {
    pub index: usize,
    pub source_path: String,
    pub error: String,
}

/// Batch result, written by `crop --report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessReport {
    pub aspect_ratio: f64,
    pub dry_run: bool,
    pub images: Vec<ImageReport>,
    pub failures: Vec<FailedImage>,
}

impl ProcessReport {
    pub fn total(&self) -> usize {
        self.images.len() + self.failures.len()
    }

    pub fn original_kb(&self) -> f64 {
        self.images.iter().map(|i| i.original_kb).sum()
    }

    pub fn new_kb(&self) -> f64 {
        self.images.iter().filter_map(|i| i.new_kb).sum()
    }
}

/// Crop every image with the production backend.
pub fn process(
    images: &[SourceImage],
    config: &Config,
    dry_run: bool,
    events: Option<Sender<ProcessEvent>>,
) -> ProcessReport {
    let backend = RustBackend::new();
    process_with_backend(&backend, images, config, dry_run, events)
}

/// Crop every image using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    images: &[SourceImage],
    config: &Config,
    dry_run: bool,
    events: Option<Sender<ProcessEvent>>,
) -> ProcessReport {
    let settings = config.crop_settings();
    let suffix = config.output.suffix.as_str();

    if let Some(tx) = &events {
        tx.send(ProcessEvent::Started {
            total: images.len(),
            dry_run,
        })
        .ok();
    }

    let results: Vec<Result<ImageReport, FailedImage>> = images
        .par_iter()
        .enumerate()
        .map_with(events, |tx, (i, image)| {
            let index = i + 1;
            let result = process_image(backend, image, index, &settings, suffix, dry_run, tx);
            let event = match &result {
                Ok(report) => ProcessEvent::ImageCropped(report.clone()),
                Err(failed) => {
                    tracing::warn!(
                        source = %failed.source_path,
                        error = %failed.error,
                        "image failed"
                    );
                    ProcessEvent::ImageFailed {
                        index,
                        source_path: failed.source_path.clone(),
                        error: failed.error.clone(),
                    }
                }
            };
            if let Some(tx) = tx {
                tx.send(event).ok();
            }
            result
        })
        .collect();

    let (mut reports, mut failures) = (Vec::new(), Vec::new());
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(failed) => failures.push(failed),
        }
    }

    ProcessReport {
        aspect_ratio: settings.aspect_ratio,
        dry_run,
        images: reports,
        failures,
    }
}

fn process_image(
    backend: &impl ImageBackend,
    image: &SourceImage,
    index: usize,
    settings: &CropSettings,
    suffix: &str,
    dry_run: bool,
    events: &Option<Sender<ProcessEvent>>,
) -> Result<ImageReport, FailedImage> {
    let source_path = image.relative_path.display().to_string();
    let output = output_path_for(&image.path, suffix);
    let output_display = output_path_for(&image.relative_path, suffix)
        .display()
        .to_string();

    if !dry_run && output.exists() {
        if let Some(tx) = events {
            tx.send(ProcessEvent::Overwriting {
                index,
                output_path: output_display.clone(),
            })
            .ok();
        }
    }

    let original_kb = bytes_to_kb(image.size_bytes);
    let outcome = crop_to_aspect(backend, &image.path, &output, original_kb, settings, dry_run)
        .map_err(|e: CropError| FailedImage {
            index,
            source_path: source_path.clone(),
            error: e.to_string(),
        })?;

    let new_kb = outcome.written_bytes.map(bytes_to_kb);
    let report = ImageReport {
        index,
        source_path,
        output_path: output_display,
        source_dimensions: outcome.source_dimensions,
        rect: outcome.choice.rect,
        score: outcome.choice.score,
        mode: outcome.choice.mode,
        candidates: outcome.choice.candidates,
        output_dimensions: (outcome.params.output_width, outcome.params.output_height),
        original_kb,
        new_kb,
        compression_pct: new_kb.map(|kb| compression_ratio(original_kb, kb)),
    };
    tracing::info!(
        source = %report.source_path,
        rect = ?report.rect,
        score = report.score,
        "cropped"
    );
    Ok(report)
}

/// Write the report as pretty-printed JSON.
pub fn write_report(report: &ProcessReport, path: &Path) -> Result<(), ProcessError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}
