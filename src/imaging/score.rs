//! Region scoring: how much a candidate crop is worth keeping.
//!
//! A candidate window is rated by three independent signals, each normalized
//! to `[0, 1]` and blended linearly with [`ScoringWeights`]:
//!
//! | Signal | Measure | Ceiling |
//! |---|---|---|
//! | Information | mean per-channel Shannon entropy of a 256-bin histogram | 8 bits |
//! | Edges | mean Sobel gradient magnitude of the luminance | 50.0 |
//! | Center | `1 − distance(window center, image center) / half diagonal` | 1.0 |
//!
//! All functions are pure: the same view and rectangle always give the same
//! score, which is what makes the search deterministic.

use super::geometry::Rect;
use super::raster::RasterView;
use serde::{Deserialize, Serialize};

/// Practical maximum of a 256-bin, 8-bit Shannon entropy.
pub const ENTROPY_CEILING: f64 = 8.0;

/// Empirical mean gradient magnitude treated as "fully structured".
pub const EDGE_CEILING: f64 = 50.0;

/// Score assigned to a window with no pixels.
pub const DEGENERATE_SCORE: f64 = 0.0;

/// Luminance weights for the R, G and B channels, in that order.
const LUMA_COEFFICIENTS: [f64; 3] = [0.2989, 0.5870, 0.1140];

/// Relative importance of the three signals. Need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringWeights {
    pub entropy: f64,
    pub edge: f64,
    pub center: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            entropy: 0.2,
            edge: 0.4,
            center: 0.4,
        }
    }
}

impl ScoringWeights {
    /// Weights must be finite, non-negative and not all zero.
    pub fn is_valid(&self) -> bool {
        let all = [self.entropy, self.edge, self.center];
        all.iter().all(|w| w.is_finite() && *w >= 0.0) && all.iter().any(|w| *w > 0.0)
    }
}

/// The three normalized signals for one candidate window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionSignals {
    pub entropy: f64,
    pub edge: f64,
    pub center: f64,
}

impl RegionSignals {
    pub fn combine(&self, weights: &ScoringWeights) -> f64 {
        weights.entropy * self.entropy + weights.edge * self.edge + weights.center * self.center
    }
}

/// Shannon entropy (bits) of a stream of 8-bit samples.
///
/// Zero-probability bins are skipped; an empty stream has entropy 0.
pub fn shannon_entropy(samples: impl IntoIterator<Item = u8>) -> f64 {
    let mut histogram = [0u64; 256];
    let mut total = 0u64;
    for value in samples {
        histogram[value as usize] += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Entropy of a single channel of the view.
pub fn channel_entropy(view: &RasterView<'_>, channel: usize) -> f64 {
    let channels = view.channels();
    shannon_entropy(
        view.rows()
            .flat_map(|row| row.iter().skip(channel).step_by(channels).copied()),
    )
}

/// Mean of the per-channel entropies (raw bits, not normalized).
pub fn image_entropy(view: &RasterView<'_>) -> f64 {
    if view.is_empty() {
        return 0.0;
    }
    let channels = view.channels();
    let sum: f64 = (0..channels).map(|c| channel_entropy(view, c)).sum();
    sum / channels as f64
}

/// Luminance plane of the view, row-major, unrounded.
///
/// Gray views are copied through unchanged.
pub fn luminance(view: &RasterView<'_>) -> Vec<f64> {
    let mut plane = Vec::with_capacity(view.pixel_count());
    match view.channels() {
        1 => {
            for row in view.rows() {
                plane.extend(row.iter().map(|&v| v as f64));
            }
        }
        channels => {
            for row in view.rows() {
                for pixel in row.chunks_exact(channels) {
                    let mut luma = 0.0;
                    for (c, coefficient) in LUMA_COEFFICIENTS.iter().enumerate() {
                        luma += coefficient * pixel[c] as f64;
                    }
                    plane.push(luma);
                }
            }
        }
    }
    plane
}

/// Map an out-of-range index back into `0..len` by half-sample symmetric
/// reflection (`d c b a | a b c d | d c b a`).
fn reflect(index: isize, len: usize) -> usize {
    let n = len as isize;
    let period = 2 * n;
    let m = index.rem_euclid(period);
    if m >= n {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

/// Mean Sobel gradient magnitude over the view's luminance.
///
/// Borders are handled by reflection, so a flat region has zero gradient all
/// the way to its edge.
pub fn mean_gradient_magnitude(view: &RasterView<'_>) -> f64 {
    if view.is_empty() {
        return 0.0;
    }
    let width = view.width() as usize;
    let height = view.height() as usize;
    let plane = luminance(view);

    let at = |x: usize, y: usize, dx: isize, dy: isize| -> f64 {
        let sx = reflect(x as isize + dx, width);
        let sy = reflect(y as isize + dy, height);
        plane[sy * width + sx]
    };

    let mut total = 0.0;
    for y in 0..height {
        for x in 0..width {
            let gx = (at(x, y, 1, -1) + 2.0 * at(x, y, 1, 0) + at(x, y, 1, 1))
                - (at(x, y, -1, -1) + 2.0 * at(x, y, -1, 0) + at(x, y, -1, 1));
            let gy = (at(x, y, -1, 1) + 2.0 * at(x, y, 0, 1) + at(x, y, 1, 1))
                - (at(x, y, -1, -1) + 2.0 * at(x, y, 0, -1) + at(x, y, 1, -1));
            total += gx.hypot(gy);
        }
    }
    total / (width * height) as f64
}

/// How close `rect` sits to the middle of a `width` × `height` image.
///
/// 1.0 when the centers coincide, falling linearly to 0.0 at a corner.
pub fn center_proximity(rect: Rect, image_width: u32, image_height: u32) -> f64 {
    let (cx, cy) = (image_width as f64 / 2.0, image_height as f64 / 2.0);
    let max_distance = cx.hypot(cy);
    if max_distance == 0.0 {
        return 1.0;
    }
    let (rx, ry) = rect.center();
    let distance = (rx - cx).hypot(ry - cy);
    (1.0 - distance / max_distance).clamp(0.0, 1.0)
}

/// Normalized signals for `view`, which covers `rect` of the full image.
pub fn region_signals(
    view: &RasterView<'_>,
    rect: Rect,
    image_width: u32,
    image_height: u32,
) -> RegionSignals {
    RegionSignals {
        entropy: (image_entropy(view) / ENTROPY_CEILING).min(1.0),
        edge: (mean_gradient_magnitude(view) / EDGE_CEILING).min(1.0),
        center: center_proximity(rect, image_width, image_height),
    }
}

/// Weighted desirability of a candidate window. Higher is better.
///
/// An empty view scores [`DEGENERATE_SCORE`] instead of failing.
pub fn score_region(
    view: &RasterView<'_>,
    rect: Rect,
    image_width: u32,
    image_height: u32,
    weights: &ScoringWeights,
) -> f64 {
    if view.is_empty() {
        tracing::trace!(?rect, "empty sample, using degenerate score");
        return DEGENERATE_SCORE;
    }
    region_signals(view, rect, image_width, image_height).combine(weights)
}
