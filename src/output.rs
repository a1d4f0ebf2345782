//! CLI output formatting for the scan and crop stages.
//!
//! Every `format_*` function is pure and returns display lines, so the exact
//! console output is unit-tested; the `print_*` wrappers only write them to
//! stdout. Diagnostics go through `tracing` on stderr instead.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Sources in content/ (2 images)
//! 001 posts/feature_sunrise.jpg
//!     4000x3000, 1843.2 KB
//! 002 posts/feature_tide.png
//!     unreadable, 12.0 KB
//! ```
//!
//! ## Crop
//!
//! ```text
//! Cropping 2 images
//! 001 posts/feature_sunrise.jpg
//!     Crop: 4000x1333 at (0, 912), score 0.713
//!     Output: posts/feature_sunrise_crop.jpg (2000x666)
//!     Size: 1843.2 KB → 412.5 KB (77.6% smaller)
//! 002 posts/feature_tide.png
//!     Error: infeasible aspect ratio 3 for a 10x10 image
//!
//! Cropped 1 of 2 images, 1 failed
//! Total: 1843.2 KB → 412.5 KB
//! ```

use crate::process::{ImageReport, ProcessEvent, ProcessReport};
use crate::scan::SourceImage;
use crate::imaging::bytes_to_kb;
use std::path::Path;

/// `001 posts/feature_a.jpg`: zero-padded position followed by the path.
pub fn image_line(index: usize, path: &str) -> String {
    format!("{:03} {}", index, path)
}

pub fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format the discovered sources. `dimensions[i]` belongs to `images[i]`;
/// `None` marks a file whose header could not be read.
pub fn format_scan_output(
    root: &Path,
    images: &[SourceImage],
    dimensions: &[Option<(u32, u32)>],
) -> Vec<String> {
    let mut lines = vec![format!(
        "Sources in {}/ ({})",
        root.display(),
        plural(images.len(), "image")
    )];

    for (i, image) in images.iter().enumerate() {
        lines.push(image_line(i + 1, &image.relative_path.display().to_string()));
        let dims = match dimensions.get(i).copied().flatten() {
            Some((w, h)) => format!("{w}x{h}"),
            None => "unreadable".to_string(),
        };
        lines.push(format!(
            "{}{}, {:.1} KB",
            indent(1),
            dims,
            bytes_to_kb(image.size_bytes)
        ));
    }
    lines
}

pub fn print_scan_output(root: &Path, images: &[SourceImage], dimensions: &[Option<(u32, u32)>]) {
    for line in format_scan_output(root, images, dimensions) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Crop output
// ============================================================================

fn format_image_report(report: &ImageReport) -> Vec<String> {
    let rect = report.rect;
    let (out_w, out_h) = report.output_dimensions;
    let mut lines = vec![
        image_line(report.index, &report.source_path),
        format!(
            "{}Crop: {}x{} at ({}, {}), score {:.3}",
            indent(1),
            rect.width(),
            rect.height(),
            rect.left,
            rect.top,
            report.score
        ),
    ];

    match (report.new_kb, report.compression_pct) {
        (Some(new_kb), Some(pct)) => {
            lines.push(format!(
                "{}Output: {} ({out_w}x{out_h})",
                indent(1),
                report.output_path
            ));
            let direction = if pct >= 0.0 { "smaller" } else { "larger" };
            lines.push(format!(
                "{}Size: {:.1} KB \u{2192} {:.1} KB ({:.1}% {direction})",
                indent(1),
                report.original_kb,
                new_kb,
                pct.abs()
            ));
        }
        _ => lines.push(format!(
            "{}Output: {} ({out_w}x{out_h}, not written)",
            indent(1),
            report.output_path
        )),
    }
    lines
}

/// Format a single crop progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { total, dry_run } => {
            let verb = if *dry_run { "Planning" } else { "Cropping" };
            vec![format!("{verb} {}", plural(*total, "image"))]
        }
        ProcessEvent::Overwriting { index, output_path } => {
            vec![format!("{:03} Overwriting {}", index, output_path)]
        }
        ProcessEvent::ImageCropped(report) => format_image_report(report),
        ProcessEvent::ImageFailed {
            index,
            source_path,
            error,
        } => vec![
            image_line(*index, source_path),
            format!("{}Error: {}", indent(1), error),
        ],
    }
}

/// Format the end-of-batch totals.
pub fn format_summary(report: &ProcessReport) -> Vec<String> {
    let verb = if report.dry_run { "Planned" } else { "Cropped" };
    let mut headline = format!(
        "{verb} {} of {}",
        report.images.len(),
        plural(report.total(), "image")
    );
    if !report.failures.is_empty() {
        headline.push_str(&format!(", {} failed", report.failures.len()));
    }

    let mut lines = vec![String::new(), headline];
    if !report.dry_run && !report.images.is_empty() {
        lines.push(format!(
            "Total: {:.1} KB \u{2192} {:.1} KB",
            report.original_kb(),
            report.new_kb()
        ));
    }
    lines
}

pub fn print_summary(report: &ProcessReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}
