//! Finds palette color pairs that are too close together.

use crate::{ConfigError, DistanceMatrix};

/// A pair of palette colors whose distance is below the collision threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// The index of the first color, always less than `j`.
    pub i: usize,
    /// The index of the second color.
    pub j: usize,
    /// The distance between the two colors.
    pub distance: f32,
}

/// Checks that a collision threshold is finite and non-negative.
///
/// # Errors
/// Returns [`ConfigError::InvalidThreshold`] otherwise.
pub fn validate_threshold(threshold: f32) -> Result<f32, ConfigError> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(threshold)
    } else {
        Err(ConfigError::InvalidThreshold(threshold))
    }
}

/// Returns every pair `(i, j)` with `i < j` and `distances[(i, j)] < threshold`.
///
/// Only the upper triangle of the matrix is read. A distance exactly equal to the threshold
/// is not a collision. Pairs are ordered by `i` and then by `j`.
///
/// # Errors
/// Returns a [`ConfigError`] if the threshold is negative or not finite.
pub fn detect_collisions(
    distances: &DistanceMatrix,
    threshold: f32,
) -> Result<Vec<Collision>, ConfigError> {
    let threshold = validate_threshold(threshold)?;

    Ok(distances
        .rows()
        .enumerate()
        .flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .skip(i + 1)
                .filter(move |&(_, &d)| d < threshold)
                .map(move |(j, &distance)| Collision { i, j, distance })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{distance_matrix, tests::*, Ciede2000};

    #[test]
    #[allow(clippy::float_cmp)]
    fn collisions_are_upper_triangle_entries_below_threshold() {
        let palette = test_palette();
        let matrix = distance_matrix(&palette, &Ciede2000).unwrap();
        let threshold = 40.0;
        let collisions = detect_collisions(&matrix, threshold).unwrap();

        for c in &collisions {
            assert!(c.i < c.j);
            assert_eq!(c.distance, matrix[(c.i, c.j)]);
            assert!(c.distance < threshold);
        }

        let expected = (0..matrix.len())
            .flat_map(|i| ((i + 1)..matrix.len()).map(move |j| (i, j)))
            .filter(|&(i, j)| matrix[(i, j)] < threshold)
            .collect::<Vec<_>>();
        let actual = collisions.iter().map(|c| (c.i, c.j)).collect::<Vec<_>>();
        assert_eq!(expected, actual);
    }

    #[test]
    fn threshold_is_strict() {
        let palette = test_palette();
        let matrix = distance_matrix(&palette, &Ciede2000).unwrap();
        let exact = matrix[(0, 1)];

        let collisions = detect_collisions(&matrix, exact).unwrap();
        assert!(!collisions.iter().any(|c| (c.i, c.j) == (0, 1)));

        let just_above = f32::from_bits(exact.to_bits() + 1);
        let collisions = detect_collisions(&matrix, just_above).unwrap();
        assert!(collisions.iter().any(|c| (c.i, c.j) == (0, 1)));
    }

    #[test]
    fn zero_threshold_finds_nothing() {
        let palette = test_palette();
        let matrix = distance_matrix(&palette, &Ciede2000).unwrap();
        assert!(detect_collisions(&matrix, 0.0).unwrap().is_empty());
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        let matrix = distance_matrix(&test_palette(), &Ciede2000).unwrap();
        assert!(detect_collisions(&matrix, -1.0).is_err());
        assert!(detect_collisions(&matrix, f32::NAN).is_err());
        assert!(detect_collisions(&matrix, f32::INFINITY).is_err());
    }
}
