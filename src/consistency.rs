//! # Left/right consistency checking
//!
//! This module cross-checks the two directional disparity maps to flag occluded pixels, and
//! repairs the flagged pixels from their nearest preceding valid neighbour.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::disparity::DisparityMap;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Scan order used when propagating valid disparities into occluded pixels.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcclusionFill {
    /// One flat scan over the whole buffer. The last pixel of a row seeds the first pixel of
    /// the next row. Bit-compatible with legacy output.
    Raster,

    /// The carried value resets at the start of every row, so fills never cross row
    /// boundaries.
    RowBounded,
}

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Merge two directional disparity maps, zeroing every pixel on which they disagree by more
/// than `threshold`.
///
/// Fails with `DimensionMismatch` if the maps differ in size.
pub fn cross_check(
    map_a: &DisparityMap,
    map_b: &DisparityMap,
    threshold: u8,
) -> Result<DisparityMap> {
    if map_a.width() != map_b.width() || map_a.height() != map_b.height() {
        return Err(Error::DimensionMismatch {
            expected_width: map_a.width(),
            expected_height: map_a.height(),
            actual_width: map_b.width(),
            actual_height: map_b.height(),
        });
    }

    let values = map_a
        .values()
        .iter()
        .zip(map_b.values().iter())
        .map(|(&a, &b)| {
            let diff = if a > b { a - b } else { b - a };
            if diff <= threshold {
                a
            } else {
                // Marked occluded
                0
            }
        })
        .collect();

    Ok(DisparityMap::from_values(map_a.width(), map_a.height(), values))
}

/// Replace every zero (occluded) pixel in place with the most recent nonzero value seen in
/// scan order. Zeros before the first nonzero value stay zero.
pub fn fill_occlusions(map: &mut DisparityMap, mode: OcclusionFill) {
    let width = map.width() as usize;

    match mode {
        OcclusionFill::Raster => fill_scan(map.values_mut()),
        OcclusionFill::RowBounded => {
            if width > 0 {
                for row in map.values_mut().chunks_exact_mut(width) {
                    fill_scan(row);
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Forward fill of one flat scan. Strictly sequential: each output depends on the running
/// carried value.
fn fill_scan(values: &mut [u8]) {
    let mut last_valid = 0u8;

    for value in values.iter_mut() {
        if *value == 0 {
            *value = last_valid;
        } else {
            last_valid = *value;
        }
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_check_with_itself_is_identity() {
        let map = DisparityMap::from_values(3, 2, vec![4, 0, 9, 2, 7, 1]);

        for threshold in [0u8, 3, 255].iter() {
            let checked = cross_check(&map, &map, *threshold).unwrap();
            assert_eq!(checked, map);
        }
    }

    #[test]
    fn cross_check_zeroes_disagreements() {
        let map_a = DisparityMap::from_values(2, 2, vec![10, 10, 10, 10]);
        let map_b = DisparityMap::from_values(2, 2, vec![10, 12, 15, 30]);

        let checked = cross_check(&map_a, &map_b, 2).unwrap();
        assert_eq!(checked.values(), &[10, 10, 0, 0]);
    }

    #[test]
    fn cross_check_rejects_mismatched_maps() {
        let map_a = DisparityMap::new(2, 3);
        let map_b = DisparityMap::new(3, 2);

        assert!(matches!(
            cross_check(&map_a, &map_b, 0),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn fill_carries_the_last_valid_value() {
        let mut map = DisparityMap::from_values(5, 1, vec![0, 0, 5, 0, 3]);
        fill_occlusions(&mut map, OcclusionFill::Raster);

        assert_eq!(map.values(), &[0, 0, 5, 5, 3]);
    }

    #[test]
    fn raster_fill_crosses_row_boundaries() {
        // The trailing value of row 0 seeds the leading zero of row 1
        let mut map = DisparityMap::from_values(3, 2, vec![0, 0, 7, 0, 2, 0]);
        fill_occlusions(&mut map, OcclusionFill::Raster);

        assert_eq!(map.values(), &[0, 0, 7, 7, 2, 2]);
    }

    #[test]
    fn row_bounded_fill_resets_per_row() {
        let mut map = DisparityMap::from_values(3, 2, vec![0, 0, 7, 0, 2, 0]);
        fill_occlusions(&mut map, OcclusionFill::RowBounded);

        assert_eq!(map.values(), &[0, 0, 7, 0, 2, 2]);
    }
}
