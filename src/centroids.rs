//! Rebuilds full Lab palette colors from chroma clusters.
//!
//! Clustering only sees the `a` and `b` channels, so each palette color takes its chroma
//! from the cluster center and its lightness from the median lightness of the cluster's samples.

use crate::{Error, InputError, LabImage, Stage};
use log::debug;
use ordered_float::OrderedFloat;
use palette::Lab;

/// Returns the median of `values`, averaging the two middle values for even lengths.
///
/// `values` is reordered. Returns `None` if `values` is empty.
pub(crate) fn median(values: &mut [f32]) -> Option<f32> {
    let n = values.len();
    if n == 0 {
        return None;
    }

    values.sort_unstable_by_key(|&v| OrderedFloat(v));
    let mid = n / 2;
    if n % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// The median lightness over every pixel of `image`.
#[must_use]
pub fn median_lightness(image: &LabImage) -> f32 {
    let mut lightness = image.pixels().iter().map(|lab| lab.l).collect::<Vec<_>>();
    // LabImage is never empty
    median(&mut lightness).unwrap_or_default()
}

/// Builds one Lab color per cluster center.
///
/// `lightness` and `labels` are indexed by sample, and `centers` by cluster id.
/// A cluster's lightness is the median lightness of its samples. A cluster with no samples
/// falls back to the median lightness of the whole `image`.
/// Chroma is copied from `centers` unchanged, including for empty clusters.
///
/// # Errors
/// Returns an input error if `lightness` and `labels` differ in length
/// or a label has no matching center, and a numeric error if a resulting color is not finite.
pub fn build_centroids(
    image: &LabImage,
    lightness: &[f32],
    labels: &[u8],
    centers: &[[f32; 2]],
) -> Result<Vec<Lab>, Error> {
    if lightness.len() != labels.len() {
        return Err(Error::input(
            Stage::Centroids,
            InputError::LabelMismatch { samples: lightness.len(), labels: labels.len() },
        ));
    }

    if let Some(&label) = labels.iter().find(|&&l| usize::from(l) >= centers.len()) {
        return Err(Error::input(
            Stage::Centroids,
            InputError::LabelOutOfRange { label, clusters: centers.len() },
        ));
    }

    let mut members = vec![Vec::new(); centers.len()];
    for (&label, &l) in labels.iter().zip(lightness) {
        members[usize::from(label)].push(l);
    }

    let mut global = None;
    let centroids = members
        .iter_mut()
        .zip(centers)
        .enumerate()
        .map(|(i, (members, &[a, b]))| {
            let l = median(members).unwrap_or_else(|| {
                debug!("cluster {i} is empty, using the image median lightness");
                *global.get_or_insert_with(|| median_lightness(image))
            });
            Lab::new(l, a, b)
        })
        .collect::<Vec<_>>();

    match centroids
        .iter()
        .position(|c| !(c.l.is_finite() && c.a.is_finite() && c.b.is_finite()))
    {
        Some(index) => Err(Error::Numeric { stage: Stage::Centroids, index }),
        None => Ok(centroids),
    }
}
