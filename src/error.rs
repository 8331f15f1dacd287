//! # Error standards
//!
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the disparity crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The images (or maps) participating in a pipeline run do not share the same dimensions.
    #[error(
        "Dimension mismatch: expected {expected_width}x{expected_height}, \
         got {actual_width}x{actual_height}"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// The correlation window is too small to produce a positive half extent.
    #[error("Invalid correlation window: {width}x{height} (both extents must be at least 2)")]
    InvalidWindow { width: usize, height: usize },

    /// The disparity search range is empty or does not fit the 8 bit output map.
    #[error("Invalid disparity range: {min}..={max}")]
    InvalidRange { min: i32, max: i32 },

    /// Error surfaced unchanged from the image codec.
    #[error("Image IO error: {0}")]
    ImageIo(#[from] image::ImageError),
}
