//! Pairwise perceptual distances between palette colors.

use crate::{ColorDifference, Error, Stage};
use palette::Lab;
use std::ops::Index;

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// A square matrix of distances between every pair of palette colors.
///
/// The diagonal is exactly `0.0`. Each row is computed independently,
/// so `matrix[(i, j)]` and `matrix[(j, i)]` agree up to the symmetry of the distance formula.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    /// The number of rows and columns.
    k: usize,
    /// The distances in row-major order.
    values: Vec<f32>,
}

impl DistanceMatrix {
    /// The number of rows (and columns) in the matrix.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.k
    }

    /// Whether the matrix has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.k == 0
    }

    /// Returns the `i`-th row.
    ///
    /// # Panics
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.k..(i + 1) * self.k]
    }

    /// Returns an iterator over the rows of the matrix.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        // chunks_exact panics on a chunk size of zero
        self.values.chunks_exact(self.k.max(1))
    }

    /// The distances in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl Index<(usize, usize)> for DistanceMatrix {
    type Output = f32;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        assert!(i < self.k && j < self.k);
        &self.values[i * self.k + j]
    }
}

/// Checks that every color is finite before any distance is computed.
fn check_finite(colors: &[Lab]) -> Result<(), Error> {
    match colors
        .iter()
        .position(|c| !(c.l.is_finite() && c.a.is_finite() && c.b.is_finite()))
    {
        Some(index) => Err(Error::Numeric { stage: Stage::Distances, index }),
        None => Ok(()),
    }
}

/// Computes the distances from `colors[i]` to every color in `colors`.
fn distance_row(
    colors: &[Lab],
    i: usize,
    metric: &impl ColorDifference,
    row: &mut [f32],
) {
    let color = colors[i];
    for (j, (d, &other)) in row.iter_mut().zip(colors).enumerate() {
        *d = if i == j { 0.0 } else { metric.difference(color, other) };
    }
}

/// Computes the distance between every pair of `colors` with the given metric.
///
/// # Errors
/// Returns a numeric error if a color is not finite.
pub fn distance_matrix(
    colors: &[Lab],
    metric: &impl ColorDifference,
) -> Result<DistanceMatrix, Error> {
    check_finite(colors)?;

    let k = colors.len();
    let mut values = vec![0.0; k * k];
    for (i, row) in values.chunks_exact_mut(k.max(1)).enumerate() {
        distance_row(colors, i, metric, row);
    }

    Ok(DistanceMatrix { k, values })
}

/// Computes the rows of [`distance_matrix`] in parallel.
///
/// This gives the same result as [`distance_matrix`].
///
/// # Errors
/// Returns a numeric error if a color is not finite.
#[cfg(feature = "threads")]
pub fn distance_matrix_par(
    colors: &[Lab],
    metric: &(impl ColorDifference + Sync),
) -> Result<DistanceMatrix, Error> {
    check_finite(colors)?;

    let k = colors.len();
    let mut values = vec![0.0; k * k];
    values
        .par_chunks_exact_mut(k.max(1))
        .enumerate()
        .for_each(|(i, row)| distance_row(colors, i, metric, row));

    Ok(DistanceMatrix { k, values })
}
