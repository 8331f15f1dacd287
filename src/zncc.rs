//! # ZNCC disparity computation
//!
//! This module provides a windowed zero-mean normalised cross-correlation (ZNCC) disparity
//! matcher. For every pixel the matcher scores each candidate displacement in the search range
//! by correlating a window around the reference pixel against the displaced window in the
//! target image, and keeps the displacement with the highest score.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::debug;
use rayon::prelude::*;
use serde::Deserialize;

use crate::disparity::{DisparityAlgorithm, DisparityMap, DisparityRange, SearchWindow};
use crate::error::*;
use crate::image::GrayByteImage;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct Zncc {
    params: Params,
    window: SearchWindow,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Full correlation window extent as `(width, height)`. Offsets run over
    /// `[-extent / 2, extent / 2)` on each axis.
    pub correlation_window_size: (usize, usize),
    pub windowing: Windowing,
    pub backend: ComputeBackend,
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// How window means are divided when border clipping drops samples.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Windowing {
    /// Divide by the number of samples actually inside both images. Unbiased near borders.
    Exact,

    /// Divide by the nominal window area regardless of clipping, biasing means near borders.
    /// Bit-compatible with legacy output.
    FixedArea,
}

/// How the per-pixel search is executed. Both backends produce identical maps.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeBackend {
    /// Plain double loop on the calling thread.
    Sequential,

    /// Rows fanned out across the rayon thread pool. Each row writes a disjoint output slice,
    /// so no synchronisation is needed beyond the final join.
    RowParallel,
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Zncc {
    /// Create a new instance of the algorithm with the given parameters.
    pub fn new(params: Params) -> Result<Self> {
        let (width, height) = params.correlation_window_size;
        let window = SearchWindow::from_extent(width, height)?;

        Ok(Self { params, window })
    }

    /// Fill one output row with the best displacement magnitude per pixel.
    fn fill_row(
        &self,
        reference: &GrayByteImage,
        target: &GrayByteImage,
        range: DisparityRange,
        row: usize,
        out_row: &mut [u8],
    ) {
        for (col, out) in out_row.iter_mut().enumerate() {
            *out = self.best_displacement(reference, target, range, row, col);
        }
    }

    /// Search the disparity range at one pixel and return `abs(best displacement)`.
    fn best_displacement(
        &self,
        reference: &GrayByteImage,
        target: &GrayByteImage,
        range: DisparityRange,
        row: usize,
        col: usize,
    ) -> u8 {
        // Sentinel below any attainable score, so the first finite score always wins
        let mut cur_max = f32::NEG_INFINITY;
        let mut disp_best = range.max;

        for d in range.min..=range.max {
            let score = self.zncc_score(reference, target, row as i32, col as i32, d);

            // Strictly greater: on ties the first displacement seen keeps the slot
            if score > cur_max {
                cur_max = score;
                disp_best = d;
            }
        }

        disp_best.abs() as u8
    }

    /// Correlation score of the window at `(row, col)` against the window displaced by `d`.
    ///
    /// Samples falling outside either image are skipped entirely. A window with no valid
    /// samples or zero variance on either side scores negative infinity so it can never
    /// displace a real match.
    fn zncc_score(
        &self,
        reference: &GrayByteImage,
        target: &GrayByteImage,
        row: i32,
        col: i32,
        d: i32,
    ) -> f32 {
        let width = reference.width() as i32;
        let height = reference.height() as i32;

        // First pass over the window: sums of the valid samples
        let mut sum_ref = 0.0f32;
        let mut sum_tgt = 0.0f32;
        let mut samples = 0u32;

        for dy in -self.window.half_height..self.window.half_height {
            let y = row + dy;
            if y < 0 || y >= height {
                continue;
            }

            for dx in -self.window.half_width..self.window.half_width {
                let x = col + dx;
                if x < 0 || x >= width || x - d < 0 || x - d >= width {
                    continue;
                }

                sum_ref += reference.get(x as usize, y as usize) as f32;
                sum_tgt += target.get((x - d) as usize, y as usize) as f32;
                samples += 1;
            }
        }

        if samples == 0 {
            // Fully clipped window, nothing to correlate
            return f32::NEG_INFINITY;
        }

        let divisor = match self.params.windowing {
            Windowing::Exact => samples as f32,
            Windowing::FixedArea => (4 * self.window.half_width * self.window.half_height) as f32,
        };

        let mean_ref = sum_ref / divisor;
        let mean_tgt = sum_tgt / divisor;

        // Second pass: zero-mean cross-correlation over the same valid samples
        let mut nominator = 0.0f32;
        let mut denom_ref = 0.0f32;
        let mut denom_tgt = 0.0f32;

        for dy in -self.window.half_height..self.window.half_height {
            let y = row + dy;
            if y < 0 || y >= height {
                continue;
            }

            for dx in -self.window.half_width..self.window.half_width {
                let x = col + dx;
                if x < 0 || x >= width || x - d < 0 || x - d >= width {
                    continue;
                }

                let centred_ref = reference.get(x as usize, y as usize) as f32 - mean_ref;
                let centred_tgt = target.get((x - d) as usize, y as usize) as f32 - mean_tgt;

                nominator += centred_ref * centred_tgt;
                denom_ref += centred_ref * centred_ref;
                denom_tgt += centred_tgt * centred_tgt;
            }
        }

        let denominator = (denom_ref * denom_tgt).sqrt();
        if denominator == 0.0 {
            // Flat window on either side
            return f32::NEG_INFINITY;
        }

        nominator / denominator
    }
}

impl DisparityAlgorithm for Zncc {
    /// Compute the disparity map of `reference` against `target` over the given range.
    ///
    /// Fails with `DimensionMismatch` or `InvalidRange` before any pixel work begins.
    fn compute(
        &self,
        reference: &GrayByteImage,
        target: &GrayByteImage,
        range: DisparityRange,
    ) -> Result<DisparityMap> {
        if reference.width() != target.width() || reference.height() != target.height() {
            return Err(Error::DimensionMismatch {
                expected_width: reference.width(),
                expected_height: reference.height(),
                actual_width: target.width(),
                actual_height: target.height(),
            });
        }

        if range.min > range.max || range.min.abs() > 255 || range.max.abs() > 255 {
            return Err(Error::InvalidRange {
                min: range.min,
                max: range.max,
            });
        }

        let width = reference.width() as usize;
        let mut map = DisparityMap::new(reference.width(), reference.height());

        if width == 0 || reference.height() == 0 {
            return Ok(map);
        }

        debug!(
            "ZNCC pass: {}x{} px, d in {}..={}, window {:?}, {:?} backend",
            reference.width(),
            reference.height(),
            range.min,
            range.max,
            self.params.correlation_window_size,
            self.params.backend
        );

        match self.params.backend {
            ComputeBackend::Sequential => {
                for (row, out_row) in map.values_mut().chunks_exact_mut(width).enumerate() {
                    self.fill_row(reference, target, range, row, out_row);
                }
            }
            ComputeBackend::RowParallel => {
                map.values_mut()
                    .par_chunks_exact_mut(width)
                    .enumerate()
                    .for_each(|(row, out_row)| {
                        self.fill_row(reference, target, range, row, out_row)
                    });
            }
        }

        Ok(map)
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            correlation_window_size: (18, 14),
            windowing: Windowing::Exact,
            backend: ComputeBackend::RowParallel,
        }
    }
}

impl Default for Windowing {
    fn default() -> Self {
        Windowing::Exact
    }
}

impl Default for ComputeBackend {
    fn default() -> Self {
        ComputeBackend::RowParallel
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic textured image so correlation windows always have variance.
    fn textured(width: u32, height: u32, seed: u32) -> GrayByteImage {
        let mut state = seed | 1;
        let pixels = (0..width * height)
            .map(|_| {
                // xorshift32
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xff) as u8
            })
            .collect();

        GrayByteImage::from_raw(width, height, pixels)
    }

    fn matcher(window: (usize, usize), backend: ComputeBackend, windowing: Windowing) -> Zncc {
        Zncc::new(Params {
            correlation_window_size: window,
            windowing,
            backend,
        })
        .unwrap()
    }

    #[test]
    fn identical_images_give_zero_disparity() {
        let img = textured(16, 12, 0xdead);
        let zncc = matcher((4, 4), ComputeBackend::Sequential, Windowing::Exact);

        let map = zncc
            .compute(&img, &img, DisparityRange::new(0, 8).unwrap())
            .unwrap();

        assert!(map.values().iter().all(|&v| v == 0));
    }

    #[test]
    fn values_stay_within_range_magnitude() {
        let left = textured(20, 10, 0x1234);
        let right = textured(20, 10, 0x9876);
        let zncc = matcher((6, 6), ComputeBackend::Sequential, Windowing::Exact);

        let range = DisparityRange::new(-3, 5).unwrap();
        let map = zncc.compute(&left, &right, range).unwrap();

        assert!(map.values().iter().all(|&v| v <= range.magnitude()));
    }

    #[test]
    fn backends_produce_identical_maps() {
        let left = textured(24, 16, 0xaaaa);
        let right = textured(24, 16, 0x5555);
        let range = DisparityRange::new(0, 10).unwrap();

        let sequential = matcher((6, 4), ComputeBackend::Sequential, Windowing::Exact)
            .compute(&left, &right, range)
            .unwrap();
        let parallel = matcher((6, 4), ComputeBackend::RowParallel, Windowing::Exact)
            .compute(&left, &right, range)
            .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn fixed_area_windowing_biases_the_border() {
        // At the top-left corner with a 2x2 window only the centre sample survives clipping.
        // Exact windowing sees a flat one-sample window (no variance, every score rejected,
        // so the range.max initialisation falls through). Fixed-area windowing divides the
        // mean by the nominal area, leaving a nonzero residual that correlates perfectly at
        // zero displacement.
        let img = GrayByteImage::from_raw(6, 6, vec![100u8; 36]);
        let range = DisparityRange::new(0, 1).unwrap();

        let exact = matcher((2, 2), ComputeBackend::Sequential, Windowing::Exact)
            .compute(&img, &img, range)
            .unwrap();
        let legacy = matcher((2, 2), ComputeBackend::Sequential, Windowing::FixedArea)
            .compute(&img, &img, range)
            .unwrap();

        assert_eq!(exact.get(0, 0), 1);
        assert_eq!(legacy.get(0, 0), 0);
    }

    #[test]
    fn mismatched_dimensions_fail_before_computing() {
        let left = textured(8, 8, 1);
        let right = textured(8, 9, 2);
        let zncc = matcher((4, 4), ComputeBackend::Sequential, Windowing::Exact);

        assert!(matches!(
            zncc.compute(&left, &right, DisparityRange::new(0, 4).unwrap()),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn degenerate_window_is_rejected_at_construction() {
        assert!(matches!(
            Zncc::new(Params {
                correlation_window_size: (1, 4),
                ..Params::default()
            }),
            Err(Error::InvalidWindow { .. })
        ));
    }
}
