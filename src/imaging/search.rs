//! Sliding-window search for the best crop at a fixed aspect ratio.
//!
//! 1. [`candidate_windows`] decides which of the two window shapes fit.
//! 2. Each window is slid along its free axis by [`slide_offsets`].
//! 3. Every candidate is scored with [`score_region`] on a borrowed view.
//! 4. The highest score wins; ties go to the earliest candidate.
//!
//! Candidates are scored in parallel on the rayon pool. Each one carries its
//! enumeration index, and the index (not completion order) breaks ties, so
//! the result is identical to a sequential scan.

use super::geometry::{Rect, SlideMode, candidate_windows, slide_offsets, slide_step};
use super::raster::Raster;
use super::score::{ScoringWeights, score_region};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("infeasible aspect ratio {aspect_ratio} for a {width}x{height} image")]
    InfeasibleGeometry {
        width: u32,
        height: u32,
        aspect_ratio: f64,
    },
    #[error("aspect ratio must be a positive finite number, got {0}")]
    InvalidAspectRatio(f64),
    #[error("step fraction must be a positive finite number, got {0}")]
    InvalidStep(f64),
    #[error("scoring weights must be finite, non-negative and not all zero: {0:?}")]
    InvalidWeights(ScoringWeights),
}

/// Tunables for a single search call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Slide step as a fraction of the free dimension.
    pub step_fraction: f64,
    /// Score the last feasible offset even when the stride skips it.
    pub include_final_offset: bool,
    pub weights: ScoringWeights,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            step_fraction: 0.02,
            include_final_offset: true,
            weights: ScoringWeights::default(),
        }
    }
}

/// One window position to be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Position in enumeration order; the tie-break key.
    pub index: usize,
    pub mode: SlideMode,
    pub rect: Rect,
}

/// The winning rectangle and how it was found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropChoice {
    pub rect: Rect,
    pub score: f64,
    pub mode: SlideMode,
    /// Number of candidate windows that were scored.
    pub candidates: usize,
}

/// List every candidate window for a `width` × `height` image, full-width
/// windows first, offsets ascending.
pub fn enumerate_candidates(
    width: u32,
    height: u32,
    aspect_ratio: f64,
    options: &SearchOptions,
) -> Result<Vec<Candidate>, SearchError> {
    if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
        return Err(SearchError::InvalidAspectRatio(aspect_ratio));
    }
    if !options.step_fraction.is_finite() || options.step_fraction <= 0.0 {
        return Err(SearchError::InvalidStep(options.step_fraction));
    }
    if !options.weights.is_valid() {
        return Err(SearchError::InvalidWeights(options.weights));
    }

    let mut candidates = Vec::new();
    for window in candidate_windows(width, height, aspect_ratio) {
        let step = slide_step(options.step_fraction, window.free_extent(width, height));
        let offsets = slide_offsets(
            window.max_offset(width, height),
            step,
            options.include_final_offset,
        );
        for offset in offsets {
            candidates.push(Candidate {
                index: candidates.len(),
                mode: window.mode,
                rect: window.rect_at(offset),
            });
        }
    }

    if candidates.is_empty() {
        return Err(SearchError::InfeasibleGeometry {
            width,
            height,
            aspect_ratio,
        });
    }
    Ok(candidates)
}

/// Find the crop of `aspect_ratio` (width / height) that scores highest.
pub fn find_best_crop(
    raster: &Raster<'_>,
    aspect_ratio: f64,
    options: &SearchOptions,
) -> Result<CropChoice, SearchError> {
    let (width, height) = (raster.width(), raster.height());
    let candidates = enumerate_candidates(width, height, aspect_ratio, options)?;

    let best = candidates
        .par_iter()
        .map(|candidate| {
            let view = raster.view(candidate.rect);
            let score = score_region(&view, candidate.rect, width, height, &options.weights);
            tracing::debug!(
                index = candidate.index,
                mode = ?candidate.mode,
                left = candidate.rect.left,
                top = candidate.rect.top,
                score,
                "scored window"
            );
            (candidate, score)
        })
        .max_by(|a, b| compare_scored(a.1, a.0.index, b.1, b.0.index));

    // enumerate_candidates never returns an empty list
    let (winner, score) = best.ok_or(SearchError::InfeasibleGeometry {
        width,
        height,
        aspect_ratio,
    })?;

    tracing::info!(
        width,
        height,
        aspect_ratio,
        rect = ?winner.rect,
        score,
        candidates = candidates.len(),
        "selected crop"
    );

    Ok(CropChoice {
        rect: winner.rect,
        score,
        mode: winner.mode,
        candidates: candidates.len(),
    })
}

/// Order scored candidates so that the maximum is the highest score, and
/// among equal scores the lowest index.
fn compare_scored(score_a: f64, index_a: usize, score_b: f64, index_b: usize) -> Ordering {
    score_a
        .total_cmp(&score_b)
        .then_with(|| index_b.cmp(&index_a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::raster::PixelBuffer;
    use crate::test_helpers::{checker_patch, gradient_rgb, uniform_gray};

    fn search(buffer: &PixelBuffer, aspect: f64) -> Result<CropChoice, SearchError> {
        find_best_crop(&buffer.raster(), aspect, &SearchOptions::default())
    }

    // =========================================================================
    // Geometry scenarios
    // =========================================================================

    #[test]
    fn exact_ratio_image_returns_full_frame() {
        let buffer = gradient_rgb(900, 300);
        let choice = search(&buffer, 3.0).unwrap();
        assert_eq!(choice.rect, Rect::new(0, 0, 900, 300).unwrap());
        // one offset per mode
        assert_eq!(choice.candidates, 2);
    }

    #[test]
    fn wider_image_gets_only_full_height_windows() {
        let buffer = gradient_rgb(1200, 300);
        let candidates =
            enumerate_candidates(1200, 300, 3.0, &SearchOptions::default()).unwrap();
        assert!(candidates.iter().all(|c| c.mode == SlideMode::FullHeight));
        assert_eq!(candidates.first().unwrap().rect.left, 0);
        assert_eq!(candidates.last().unwrap().rect.left, 300);

        let choice = search(&buffer, 3.0).unwrap();
        assert_eq!((choice.rect.width(), choice.rect.height()), (900, 300));
    }

    #[test]
    fn square_ratio_on_three_to_one_image_uses_both_modes() {
        // 3000x1000 at 3.0: both shapes are the full frame, one offset each
        let candidates =
            enumerate_candidates(3000, 1000, 3.0, &SearchOptions::default()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].mode, SlideMode::FullWidth);
        assert_eq!(candidates[1].mode, SlideMode::FullHeight);
        for c in &candidates {
            assert_eq!(c.rect, Rect::new(0, 0, 3000, 1000).unwrap());
        }
    }

    #[test]
    fn tall_image_enumerates_to_trailing_edge() {
        // 1000x2000 at 3.0: 1000x333 window, free extent 2000, step 40
        let candidates =
            enumerate_candidates(1000, 2000, 3.0, &SearchOptions::default()).unwrap();
        let tops: Vec<u32> = candidates.iter().map(|c| c.rect.top).collect();
        assert_eq!(tops[1], 40);
        assert_eq!(*tops.last().unwrap(), 1667);
        assert_eq!(tops[tops.len() - 2], 1640);
    }

    #[test]
    fn trailing_edge_can_be_skipped_like_a_plain_range() {
        let options = SearchOptions {
            include_final_offset: false,
            ..SearchOptions::default()
        };
        let candidates = enumerate_candidates(1000, 2000, 3.0, &options).unwrap();
        assert_eq!(candidates.last().unwrap().rect.top, 1640);
    }

    #[test]
    fn extreme_ratio_falls_back_to_the_feasible_mode() {
        let buffer = gradient_rgb(50, 50);
        let choice = search(&buffer, 10.0).unwrap();
        assert_eq!(choice.mode, SlideMode::FullWidth);
        assert_eq!((choice.rect.width(), choice.rect.height()), (50, 5));
    }

    #[test]
    fn infeasible_geometry_is_an_error() {
        let buffer = gradient_rgb(10, 10);
        let err = search(&buffer, 100.0).unwrap_err();
        assert_eq!(
            err,
            SearchError::InfeasibleGeometry {
                width: 10,
                height: 10,
                aspect_ratio: 100.0,
            }
        );
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let buffer = gradient_rgb(10, 10);
        assert!(matches!(
            search(&buffer, 0.0),
            Err(SearchError::InvalidAspectRatio(_))
        ));
        assert!(matches!(
            search(&buffer, f64::NAN),
            Err(SearchError::InvalidAspectRatio(_))
        ));
        let options = SearchOptions {
            step_fraction: -0.1,
            ..SearchOptions::default()
        };
        assert!(matches!(
            find_best_crop(&buffer.raster(), 1.0, &options),
            Err(SearchError::InvalidStep(_))
        ));
    }

    #[test]
    fn unusable_weights_are_rejected_before_scoring() {
        let buffer = checker_patch(60, 60, (0, 0, 30, 30));
        for weights in [
            ScoringWeights {
                entropy: f64::NAN,
                ..ScoringWeights::default()
            },
            ScoringWeights {
                edge: -1.0,
                ..ScoringWeights::default()
            },
            ScoringWeights {
                entropy: 0.0,
                edge: 0.0,
                center: 0.0,
            },
        ] {
            let options = SearchOptions {
                weights,
                ..SearchOptions::default()
            };
            assert!(matches!(
                find_best_crop(&buffer.raster(), 2.0, &options),
                Err(SearchError::InvalidWeights(_))
            ));
        }
    }

    #[test]
    fn result_is_in_bounds_and_matches_ratio() {
        let sizes = [(640, 480), (480, 640), (333, 200), (1024, 100), (97, 311)];
        let ratios = [0.5, 1.0, 1.5, 3.0, 4.0];
        for (w, h) in sizes {
            let buffer = gradient_rgb(w, h);
            for ratio in ratios {
                let Ok(choice) = search(&buffer, ratio) else {
                    continue;
                };
                let rect = choice.rect;
                assert!(rect.fits_within(w, h), "{rect:?} escapes {w}x{h}");
                // the constrained side is within one pixel of the ideal
                let ideal_h = rect.width() as f64 / ratio;
                let ideal_w = rect.height() as f64 * ratio;
                assert!(
                    (ideal_h - rect.height() as f64).abs() < 1.0
                        || (ideal_w - rect.width() as f64).abs() < 1.0,
                    "{rect:?} does not match ratio {ratio}"
                );
            }
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    #[test]
    fn search_is_deterministic() {
        let buffer = checker_patch(200, 600, (20, 380, 180, 560));
        let first = search(&buffer, 1.0).unwrap();
        for _ in 0..5 {
            assert_eq!(search(&buffer, 1.0).unwrap(), first);
        }
    }

    #[test]
    fn detailed_region_beats_flat_center() {
        // Busy patch near the top of a tall, otherwise flat image. A window
        // that misses the patch scores at most the center weight.
        let buffer = checker_patch(200, 600, (10, 10, 190, 190));
        let choice = search(&buffer, 1.0).unwrap();
        assert_eq!(choice.mode, SlideMode::FullWidth);
        assert!(
            choice.rect.top < 190,
            "expected a window overlapping the patch, got {:?}",
            choice.rect
        );
        assert!(choice.score > ScoringWeights::default().center);
    }

    #[test]
    fn flat_image_prefers_the_center() {
        let buffer = uniform_gray(200, 600, 90);
        let choice = search(&buffer, 1.0).unwrap();
        // 200x200 window, free extent 600, step 12: offset 204 is closest to 200
        let center_top = choice.rect.top as i64;
        assert!((center_top - 200).abs() <= 12, "got {:?}", choice.rect);
    }

    #[test]
    fn ties_go_to_the_first_enumerated_candidate() {
        // Square image at 1:1, nothing but center bias switched off: every
        // candidate scores zero and the full-width window enumerates first
        let buffer = uniform_gray(100, 100, 0);
        let options = SearchOptions {
            weights: ScoringWeights {
                entropy: 1.0,
                edge: 1.0,
                center: 0.0,
            },
            ..SearchOptions::default()
        };
        let choice = find_best_crop(&buffer.raster(), 1.0, &options).unwrap();
        assert_eq!(choice.mode, SlideMode::FullWidth);
        assert_eq!(choice.score, 0.0);

        let wide = uniform_gray(300, 100, 0);
        let choice = find_best_crop(&wide.raster(), 1.0, &options).unwrap();
        assert_eq!(choice.rect.left, 0);
    }

    #[test]
    fn compare_scored_breaks_ties_by_index() {
        assert_eq!(compare_scored(1.0, 0, 1.0, 5), Ordering::Greater);
        assert_eq!(compare_scored(1.0, 5, 1.0, 0), Ordering::Less);
        assert_eq!(compare_scored(0.5, 0, 1.0, 5), Ordering::Less);
    }
}
