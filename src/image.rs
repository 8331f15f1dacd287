//! # Grayscale image containers
//!
//! This module provides the owned 8-bit grayscale buffer consumed by the disparity engine, the
//! rectified stereo pair built from two of them, and conversions to and from the image codec.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use image::GrayImage;

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// An owned, row-major, 8-bit grayscale image.
///
/// The buffer is immutable once built; the engine only ever reads from it.
#[derive(Clone, Debug)]
pub struct GrayByteImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// A rectified stereo pair. Both images are guaranteed to share dimensions.
pub struct StereoPair {
    pub left: GrayByteImage,
    pub right: GrayByteImage,
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl GrayByteImage {
    /// Build an image from raw row-major bytes.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len() != width * height`.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(
            pixels.len(),
            (width * height) as usize,
            "pixel buffer length must equal width * height"
        );

        Self {
            width,
            height,
            pixels,
        }
    }

    /// Load an image from disk, converting to 8-bit grayscale if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let luma = image::open(path)?.to_luma();

        let width = luma.width();
        let height = luma.height();

        Ok(Self {
            width,
            height,
            pixels: luma.into_raw(),
        })
    }

    /// Encode the image as a grayscale file (format chosen from the extension).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_luma().save(path)?;
        Ok(())
    }

    /// Converts the image into a Luma8 buffer for the codec.
    pub fn to_luma(&self) -> GrayImage {
        let mut new = GrayImage::new(self.width, self.height);

        for y in 0..self.height {
            for x in 0..self.width {
                *new.get_pixel_mut(x, y) = image::Luma([self.get(x as usize, y as usize)]);
            }
        }

        new
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the pixel at `(x, y)`, with `x` the column and `y` the row.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width as usize + x]
    }

    /// The whole buffer in row-major order.
    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }
}

impl StereoPair {
    /// Pair up two images, checking that their dimensions agree.
    pub fn new(left: GrayByteImage, right: GrayByteImage) -> Result<Self> {
        if left.width() != right.width() || left.height() != right.height() {
            return Err(Error::DimensionMismatch {
                expected_width: left.width(),
                expected_height: left.height(),
                actual_width: right.width(),
                actual_height: right.height(),
            });
        }

        Ok(Self { left, right })
    }

    /// Load both halves of a pair from disk.
    pub fn open<P: AsRef<Path>>(left_path: P, right_path: P) -> Result<Self> {
        let left = GrayByteImage::open(left_path)?;
        let right = GrayByteImage::open(right_path)?;

        Self::new(left, right)
    }

    pub fn width(&self) -> u32 {
        self.left.width()
    }

    pub fn height(&self) -> u32 {
        self.left.height()
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
