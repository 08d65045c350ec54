use crate::{Ciede2000, ColorDifference, Error, InputError, LabImage, Stage};
use palette::Lab;

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Summary statistics of the per-pixel CIEDE2000 distance between two images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaStats {
    /// The average distance over all pixels.
    pub mean: f32,
    /// The largest distance of any pixel.
    pub max: f32,
    /// The smallest distance of any pixel.
    pub min: f32,
}

impl DeltaStats {
    /// The stats of a single pixel distance.
    fn single(delta: f32) -> (f64, f32, f32) {
        (f64::from(delta), delta, delta)
    }

    /// Merges two partial `(sum, max, min)` triples.
    fn merge(a: (f64, f32, f32), b: (f64, f32, f32)) -> (f64, f32, f32) {
        (a.0 + b.0, a.1.max(b.1), a.2.min(b.2))
    }

    /// Finishes a `(sum, max, min)` triple over `n` pixels.
    fn finish((sum, max, min): (f64, f32, f32), n: usize) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        let mean = (sum / n as f64) as f32;
        Self { mean, max, min }
    }
}

/// Empty `(sum, max, min)` triple.
const IDENTITY: (f64, f32, f32) = (0.0, f32::NEG_INFINITY, f32::INFINITY);

/// Checks that both images have the same dimensions.
fn check_dimensions(original: &LabImage, simulated: &LabImage) -> Result<(), Error> {
    if (original.width(), original.height()) == (simulated.width(), simulated.height()) {
        Ok(())
    } else {
        Err(Error::input(
            Stage::Simulation,
            InputError::DimensionMismatch {
                expected: original.num_pixels(),
                actual: simulated.num_pixels(),
            },
        ))
    }
}

/// The distance between two corresponding pixels.
#[inline]
fn pixel_delta((&a, &b): (&Lab, &Lab)) -> f32 {
    Ciede2000.difference(a, b)
}

/// Computes how far each pixel of `simulated` is from the same pixel of `original`.
///
/// # Errors
/// Returns an input error if the images have different dimensions.
pub fn delta_stats(original: &LabImage, simulated: &LabImage) -> Result<DeltaStats, Error> {
    check_dimensions(original, simulated)?;

    let stats = original
        .pixels()
        .iter()
        .zip(simulated.pixels())
        .map(pixel_delta)
        .map(DeltaStats::single)
        .fold(IDENTITY, DeltaStats::merge);

    Ok(DeltaStats::finish(stats, original.num_pixels()))
}

/// Computes [`delta_stats`] in parallel.
///
/// The mean may differ from [`delta_stats`] by floating point rounding.
///
/// # Errors
/// Returns an input error if the images have different dimensions.
#[cfg(feature = "threads")]
pub fn delta_stats_par(original: &LabImage, simulated: &LabImage) -> Result<DeltaStats, Error> {
    check_dimensions(original, simulated)?;

    let stats = original
        .pixels()
        .par_iter()
        .zip(simulated.pixels())
        .map(pixel_delta)
        .map(DeltaStats::single)
        .reduce(|| IDENTITY, DeltaStats::merge);

    Ok(DeltaStats::finish(stats, original.num_pixels()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{simulate_srgb, tests::*, CvdSimulation, Deficiency, Severity};

    fn simulated(image: &LabImage, simulation: &CvdSimulation) -> LabImage {
        let pixels = simulate_srgb(&image.to_srgb(), simulation);
        LabImage::from_srgb(&pixels, image.width(), image.height()).unwrap()
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn identical_images_have_zero_delta() {
        let image = gradient_image(16, 8);
        let stats = delta_stats(&image, &image).unwrap();
        assert_eq!(stats, DeltaStats { mean: 0.0, max: 0.0, min: 0.0 });
    }

    #[test]
    fn full_deficiency_changes_colors() {
        let image = gradient_image(16, 8);
        let simulation = CvdSimulation::new(Deficiency::Protan, Severity::FULL);
        let stats = delta_stats(&image, &simulated(&image, &simulation)).unwrap();

        assert!(stats.min >= 0.0);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert!(stats.max > 1.0);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let err = delta_stats(&gradient_image(4, 4), &gradient_image(4, 5)).unwrap_err();
        assert!(matches!(
            err,
            Error::Input { kind: InputError::DimensionMismatch { expected: 16, actual: 20 }, .. }
        ));
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_sequential() {
        let image = gradient_image(16, 8);
        let simulation = CvdSimulation::new(Deficiency::Tritan, Severity::FULL);
        let other = simulated(&image, &simulation);

        let seq = delta_stats(&image, &other).unwrap();
        let par = delta_stats_par(&image, &other).unwrap();
        assert!((seq.mean - par.mean).abs() < 1e-4);
        assert!((seq.max - par.max).abs() < f32::EPSILON);
        assert!((seq.min - par.min).abs() < f32::EPSILON);
    }
}
