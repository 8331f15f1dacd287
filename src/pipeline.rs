//! # Disparity pipeline
//!
//! This module chains the full disparity computation: a ZNCC pass in each direction,
//! cross-checking, occlusion filling and normalisation, producing one grayscale image ready
//! for encoding.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::time::Instant;

use log::{debug, info};
use serde::Deserialize;

use crate::consistency::{self, OcclusionFill};
use crate::disparity::{DisparityAlgorithm, DisparityRange};
use crate::error::*;
use crate::image::{GrayByteImage, StereoPair};
use crate::normalize;
use crate::zncc::{ComputeBackend, Params, Windowing, Zncc};

#[cfg(feature = "statistics")]
use crate::disparity::DisparityMap;
#[cfg(feature = "statistics")]
use plotters::prelude::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Full configuration surface of the pipeline. All options trade match quality against speed
/// and have no other side effects.
#[derive(Deserialize, Debug, Clone)]
pub struct PipelineConfig {
    /// Correlation window extent as `(width, height)`.
    pub correlation_window_size: (usize, usize),

    /// Primary (left to right) search range. The reverse pass uses the mirrored range.
    pub min_disparity: i32,
    pub max_disparity: i32,

    /// Largest allowed left/right disparity discrepancy before a pixel is marked occluded.
    pub cross_check_threshold: u8,

    pub windowing: Windowing,
    pub occlusion_fill: OcclusionFill,
    pub backend: ComputeBackend,
}

pub struct Pipeline {
    zncc: Zncc,
    range: DisparityRange,
    config: PipelineConfig,
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            correlation_window_size: (18, 14),
            min_disparity: 0,
            max_disparity: 64,
            cross_check_threshold: 12,
            windowing: Windowing::Exact,
            occlusion_fill: OcclusionFill::Raster,
            backend: ComputeBackend::RowParallel,
        }
    }
}

impl Pipeline {
    /// Build a pipeline from the given configuration.
    ///
    /// All validation happens here, before any pixel work: an empty disparity range or a
    /// degenerate window fails the construction.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let range = DisparityRange::new(config.min_disparity, config.max_disparity)?;

        let zncc = Zncc::new(Params {
            correlation_window_size: config.correlation_window_size,
            windowing: config.windowing,
            backend: config.backend,
        })?;

        Ok(Self {
            zncc,
            range,
            config,
        })
    }

    /// Run the full pipeline on a stereo pair and return the normalised disparity image.
    ///
    /// The strict stage sequence is: ZNCC left-to-right, ZNCC right-to-left over the mirrored
    /// range, cross-check, occlusion fill, normalise. No partial result is ever returned on
    /// error.
    pub fn run(&self, pair: &StereoPair) -> Result<GrayByteImage> {
        let start = Instant::now();

        // The two directional passes only read the input images, so they can run side by side
        let (forward, reverse) = rayon::join(
            || self.zncc.compute(&pair.left, &pair.right, self.range),
            || self.zncc.compute(&pair.right, &pair.left, self.range.mirrored()),
        );
        let forward = forward?;
        let reverse = reverse?;

        debug!("Directional passes finished in {:.1?}", start.elapsed());

        let stage = Instant::now();

        let mut merged =
            consistency::cross_check(&forward, &reverse, self.config.cross_check_threshold)?;
        consistency::fill_occlusions(&mut merged, self.config.occlusion_fill);
        normalize::normalize(&mut merged);

        debug!(
            "Cross-check, fill and normalise finished in {:.1?}",
            stage.elapsed()
        );

        #[cfg(feature = "statistics")]
        self.plot_histogram(&merged);

        info!(
            "Disparity pipeline finished in {:.1?} ({}x{} px)",
            start.elapsed(),
            pair.width(),
            pair.height()
        );

        Ok(merged.into_image())
    }

    // ---- PLOTTING ----
    #[cfg(feature = "statistics")]
    fn plot_histogram(&self, map: &DisparityMap) {
        let mut counts = vec![0usize; 256];
        for &value in map.values() {
            counts[value as usize] += 1;
        }
        let peak = counts.iter().max().copied().unwrap_or(0);

        let histogram = BitMapBackend::new(
            "plots/zncc/disparity_histogram.png",
            (800, 600)
        ).into_drawing_area();
        histogram.fill(&WHITE).unwrap();

        let mut chart = ChartBuilder::on(&histogram)
            .caption("Disparity value histogram", ("sans-serif", 20).into_font())
            .margin(5)
            .x_label_area_size(30)
            .y_label_area_size(30)
            .build_ranged(
                0..256usize,
                0..peak + 1
            ).unwrap();

        chart.configure_mesh().draw().unwrap();

        chart
            .draw_series(LineSeries::new(
                counts.into_iter().enumerate(),
                &RED
            )).unwrap();

        println!("Stats plotting complete");
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_range_fails_construction() {
        let config = PipelineConfig {
            min_disparity: 10,
            max_disparity: 5,
            ..PipelineConfig::default()
        };

        assert!(matches!(
            Pipeline::new(config),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn degenerate_window_fails_construction() {
        let config = PipelineConfig {
            correlation_window_size: (0, 14),
            ..PipelineConfig::default()
        };

        assert!(matches!(
            Pipeline::new(config),
            Err(Error::InvalidWindow { .. })
        ));
    }

    #[test]
    fn default_config_matches_reference_tuning() {
        let config = PipelineConfig::default();

        assert_eq!(config.correlation_window_size, (18, 14));
        assert_eq!(config.min_disparity, 0);
        assert_eq!(config.max_disparity, 64);
        assert_eq!(config.cross_check_threshold, 12);
    }
}
