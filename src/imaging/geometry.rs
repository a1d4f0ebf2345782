//! Window geometry for the aspect-ratio search.
//!
//! Everything here is integer/float arithmetic on dimensions: no pixels, no
//! I/O. The search module asks this module which window sizes fit an image
//! and at which offsets each window should be tried.
//!
//! ## Slide modes
//!
//! A crop of a fixed aspect ratio always consumes one image dimension
//! completely, so only the other axis is free:
//!
//! ```text
//! SlideMode::FullWidth            SlideMode::FullHeight
//! full width, moves down         full height, moves right
//! ┌──────────────┐               ┌──────────────┐
//! │▓▓▓▓▓▓▓▓▓▓▓▓▓▓│ top = 0       │▓▓▓▓▓│        │
//! │▓▓▓▓▓▓▓▓▓▓▓▓▓▓│               │▓▓▓▓▓│        │
//! │      ↓       │               │▓▓▓▓▓│  →     │
//! └──────────────┘               └──────────────┘
//! ```
//!
//! Window extents are truncated toward zero, so a window matches the target
//! ratio to within one pixel.

use serde::Serialize;

/// Crop rectangle in raster coordinates. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    /// Build a non-empty rectangle. Returns `None` unless `left < right` and
    /// `top < bottom`.
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Option<Self> {
        (left < right && top < bottom).then_some(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Geometric center in continuous pixel coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.left as f64 + self.right as f64) / 2.0,
            (self.top as f64 + self.bottom as f64) / 2.0,
        )
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    /// True if the rectangle lies entirely inside a `width` × `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right <= width && self.bottom <= height
    }
}

/// Which image dimension a fixed-size window spans completely.
///
/// Reported as `"horizontal"` for the full-width window (a horizontal strip
/// moving down) and `"vertical"` for the full-height one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SlideMode {
    /// Full-width window, offset is the `top` row.
    #[serde(rename = "horizontal")]
    FullWidth,
    /// Full-height window, offset is the `left` column.
    #[serde(rename = "vertical")]
    FullHeight,
}

/// A fixed-size crop window and the axis it slides along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub mode: SlideMode,
    pub width: u32,
    pub height: u32,
}

impl Window {
    /// Extent of the image along the sliding axis.
    pub fn free_extent(&self, image_width: u32, image_height: u32) -> u32 {
        match self.mode {
            SlideMode::FullWidth => image_height,
            SlideMode::FullHeight => image_width,
        }
    }

    /// Last offset at which the window still fits inside the image.
    pub fn max_offset(&self, image_width: u32, image_height: u32) -> u32 {
        match self.mode {
            SlideMode::FullWidth => image_height.saturating_sub(self.height),
            SlideMode::FullHeight => image_width.saturating_sub(self.width),
        }
    }

    /// The rectangle covered by this window at `offset` along its axis.
    pub fn rect_at(&self, offset: u32) -> Rect {
        match self.mode {
            SlideMode::FullWidth => Rect {
                left: 0,
                top: offset,
                right: self.width,
                bottom: offset + self.height,
            },
            SlideMode::FullHeight => Rect {
                left: offset,
                top: 0,
                right: offset + self.width,
                bottom: self.height,
            },
        }
    }
}

/// Compute the feasible windows for an image and a `width / height` ratio.
///
/// Returns zero, one or two windows, full-width first. A window whose
/// constrained extent truncates to zero or exceeds the image is infeasible
/// and left out. `aspect_ratio` must be positive and finite; callers validate.
pub fn candidate_windows(image_width: u32, image_height: u32, aspect_ratio: f64) -> Vec<Window> {
    let mut windows = Vec::with_capacity(2);

    // `as u32` truncates and saturates, which is the rounding we want.
    let full_width_height = (image_width as f64 / aspect_ratio) as u32;
    if full_width_height > 0 && full_width_height <= image_height {
        windows.push(Window {
            mode: SlideMode::FullWidth,
            width: image_width,
            height: full_width_height,
        });
    }

    let full_height_width = (image_height as f64 * aspect_ratio) as u32;
    if full_height_width > 0 && full_height_width <= image_width {
        windows.push(Window {
            mode: SlideMode::FullHeight,
            width: full_height_width,
            height: image_height,
        });
    }

    windows
}

/// Stride between consecutive offsets: `max(1, round(fraction × extent))`.
pub fn slide_step(step_fraction: f64, free_extent: u32) -> u32 {
    ((step_fraction * free_extent as f64).round() as u32).max(1)
}

/// Generate the offsets `0, step, 2·step, …` that do not pass `max_offset`.
///
/// With `include_final` set, `max_offset` itself is yielded last when the
/// stride does not land on it, so the trailing edge of the image is always
/// scored.
pub fn slide_offsets(max_offset: u32, step: u32, include_final: bool) -> SlideOffsets {
    SlideOffsets {
        next: Some(0),
        max_offset,
        step: step.max(1),
        include_final,
    }
}

/// Iterator returned by [`slide_offsets`].
#[derive(Debug, Clone)]
pub struct SlideOffsets {
    next: Option<u32>,
    max_offset: u32,
    step: u32,
    include_final: bool,
}

impl Iterator for SlideOffsets {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let current = self.next?;
        self.next = match current.checked_add(self.step) {
            Some(n) if n <= self.max_offset => Some(n),
            _ if self.include_final && current < self.max_offset => Some(self.max_offset),
            _ => None,
        };
        Some(current)
    }
}
