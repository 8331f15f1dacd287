//! # Disparity Computation
//!
//! This crate provides a dense stereo disparity pipeline for rectified grayscale image pairs:
//! a windowed ZNCC correlation search run in both directions, left/right cross-checking with
//! occlusion filling, and contrast normalisation of the final map.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod consistency;
mod disparity;
mod error;
mod image;
pub mod normalize;
mod pipeline;
pub mod zncc;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub mod prelude {
    pub use crate::disparity::{DisparityAlgorithm, DisparityMap, DisparityRange, SearchWindow};
    pub use crate::error::{Error, Result};
    pub use crate::image::{GrayByteImage, StereoPair};
    pub use crate::pipeline::{Pipeline, PipelineConfig};
}
