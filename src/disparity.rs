//! # General disparity objects
//!
//! This module provides generic disparity traits and structures for use by different algorithms.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::error::*;
use crate::image::GrayByteImage;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A dense disparity map storing the magnitude of the chosen displacement per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct DisparityMap {
    width: u32,
    height: u32,
    values: Vec<u8>,
}

/// An inclusive displacement search range. May be negative for reverse-direction passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisparityRange {
    pub min: i32,
    pub max: i32,
}

/// Half extents of the correlation window. Offsets run over `[-half, half)` on each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchWindow {
    pub half_width: i32,
    pub half_height: i32,
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity map of `reference` against `target` over the given range.
    fn compute(
        &self,
        reference: &GrayByteImage,
        target: &GrayByteImage,
        range: DisparityRange,
    ) -> Result<DisparityMap>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityMap {
    /// A zero-filled map of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        DisparityMap {
            width,
            height,
            values: vec![0u8; (width * height) as usize],
        }
    }

    /// Build a map from raw row-major values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != width * height`.
    pub fn from_values(width: u32, height: u32, values: Vec<u8>) -> Self {
        assert_eq!(
            values.len(),
            (width * height) as usize,
            "value buffer length must equal width * height"
        );

        DisparityMap {
            width,
            height,
            values,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The disparity value at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.values[y * self.width as usize + x]
    }

    /// The whole map as one row-major sequence.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [u8] {
        &mut self.values
    }

    /// Converts the map into a grayscale image for encoding.
    pub fn into_image(self) -> GrayByteImage {
        GrayByteImage::from_raw(self.width, self.height, self.values)
    }
}

impl DisparityRange {
    /// A validated inclusive range.
    ///
    /// Fails with `InvalidRange` if the range is empty or its largest magnitude does not fit
    /// the 8 bit output map.
    pub fn new(min: i32, max: i32) -> Result<Self> {
        if min > max || min.abs() > 255 || max.abs() > 255 {
            return Err(Error::InvalidRange { min, max });
        }

        Ok(Self { min, max })
    }

    /// The mirrored range used by the reverse-direction pass.
    pub fn mirrored(&self) -> Self {
        Self {
            min: -self.max,
            max: -self.min,
        }
    }

    /// Largest displacement magnitude the range can select.
    pub fn magnitude(&self) -> u8 {
        self.min.abs().max(self.max.abs()) as u8
    }
}

impl SearchWindow {
    /// Half extents derived from a full window extent, matching the `-extent/2..extent/2`
    /// offset convention.
    ///
    /// Fails with `InvalidWindow` if either half extent would be zero.
    pub fn from_extent(width: usize, height: usize) -> Result<Self> {
        let half_width = (width / 2) as i32;
        let half_height = (height / 2) as i32;

        if half_width <= 0 || half_height <= 0 {
            return Err(Error::InvalidWindow { width, height });
        }

        Ok(Self {
            half_width,
            half_height,
        })
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_rejects_inverted_bounds() {
        assert!(matches!(
            DisparityRange::new(5, 4),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn range_rejects_oversized_magnitude() {
        assert!(matches!(
            DisparityRange::new(0, 256),
            Err(Error::InvalidRange { .. })
        ));
        assert!(matches!(
            DisparityRange::new(-256, 0),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn range_mirrors_both_bounds() {
        let range = DisparityRange::new(0, 64).unwrap();
        let mirrored = range.mirrored();

        assert_eq!(mirrored.min, -64);
        assert_eq!(mirrored.max, 0);
        assert_eq!(mirrored.magnitude(), 64);
    }

    #[test]
    fn window_rejects_degenerate_extents() {
        assert!(matches!(
            SearchWindow::from_extent(1, 14),
            Err(Error::InvalidWindow { .. })
        ));
        assert!(matches!(
            SearchWindow::from_extent(18, 0),
            Err(Error::InvalidWindow { .. })
        ));
    }

    #[test]
    fn window_halves_extents() {
        let window = SearchWindow::from_extent(18, 14).unwrap();
        assert_eq!(window.half_width, 9);
        assert_eq!(window.half_height, 7);
    }
}
