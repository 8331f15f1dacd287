//! # Disparity map normalisation
//!
//! This module stretches a disparity map to the full 0-255 output range so the result is
//! visible as a grayscale image.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::disparity::DisparityMap;

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Contrast-stretch the map in place so its minimum maps to 0 and its maximum to 255.
///
/// Uses integer arithmetic with truncation, not rounding, matching legacy output bit for
/// bit. A constant map has no contrast to stretch and becomes all zeros.
pub fn normalize(map: &mut DisparityMap) {
    let values = map.values_mut();

    if values.is_empty() {
        return;
    }

    let mut min = 255u8;
    let mut max = 0u8;

    for &value in values.iter() {
        if value > max {
            max = value;
        }
        if value < min {
            min = value;
        }
    }

    if max == min {
        for value in values.iter_mut() {
            *value = 0;
        }
        return;
    }

    let span = (max - min) as u32;

    for value in values.iter_mut() {
        *value = (255 * (*value - min) as u32 / span) as u8;
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretches_to_full_range_with_truncation() {
        let mut map = DisparityMap::from_values(3, 1, vec![10, 20, 30]);
        normalize(&mut map);

        // floor(255 * 10 / 20) = 127, not 128
        assert_eq!(map.values(), &[0, 127, 255]);
    }

    #[test]
    fn constant_map_becomes_zero() {
        for fill in [0u8, 42, 255].iter() {
            let mut map = DisparityMap::from_values(2, 2, vec![*fill; 4]);
            normalize(&mut map);

            assert_eq!(map.values(), &[0, 0, 0, 0]);
        }
    }

    #[test]
    fn extremes_map_to_extremes() {
        let mut map = DisparityMap::from_values(4, 1, vec![3, 64, 100, 255]);
        normalize(&mut map);

        assert_eq!(map.values()[0], 0);
        assert_eq!(map.values()[3], 255);
    }
}
