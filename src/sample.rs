//! Reproducible sampling of chroma values from an image.

use crate::LabImage;
use log::debug;
use rand::{seq::index, Rng};

/// Chroma samples drawn from a [`LabImage`].
///
/// The order of the samples is the index space shared by the cluster labels
/// and the centroid builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaSamples {
    /// The `[a, b]` components of each sampled pixel.
    chroma: Vec<[f32; 2]>,
    /// The `(row, column)` each sample was taken from.
    coords: Vec<(u32, u32)>,
}

impl ChromaSamples {
    /// The `[a, b]` components of each sample.
    #[must_use]
    pub fn chroma(&self) -> &[[f32; 2]] {
        &self.chroma
    }

    /// The `(row, column)` of each sample in the source image.
    #[must_use]
    pub fn coords(&self) -> &[(u32, u32)] {
        &self.coords
    }

    /// The number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chroma.len()
    }

    /// Whether there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chroma.is_empty()
    }

    /// Looks up the Lab lightness of each sample in `image`.
    ///
    /// `image` should be the image these samples were drawn from.
    #[must_use]
    pub fn lightness(&self, image: &LabImage) -> Vec<f32> {
        self.coords
            .iter()
            .map(|&(row, col)| image.get(row, col).l)
            .collect()
    }
}

/// Draws `min(max_samples, width * height)` distinct pixels from `image` uniformly at random.
///
/// Which pixels are chosen, and in what order, depends only on the image dimensions
/// and the state of `rng`. If `max_samples` covers the whole image,
/// every pixel is returned exactly once in a shuffled order.
pub fn sample_chroma(image: &LabImage, max_samples: usize, rng: &mut impl Rng) -> ChromaSamples {
    let total = image.num_pixels();
    let amount = max_samples.min(total);
    let width = image.width() as usize;

    let (chroma, coords) = index::sample(rng, total, amount)
        .into_iter()
        .map(|i| {
            let lab = image.pixels()[i];
            #[allow(clippy::cast_possible_truncation)]
            let coord = ((i / width) as u32, (i % width) as u32);
            ([lab.a, lab.b], coord)
        })
        .unzip();

    debug!("sampled {amount} of {total} pixels");

    ChromaSamples { chroma, coords }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoroshiro128PlusPlus;

    #[test]
    fn full_coverage_visits_every_pixel_once() {
        let image = gradient_image(13, 7);
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(42);
        let samples = sample_chroma(&image, 1_000, &mut rng);

        assert_eq!(samples.len(), image.num_pixels());

        let mut coords = samples.coords().to_vec();
        coords.sort_unstable();
        coords.dedup();
        assert_eq!(coords.len(), image.num_pixels());
    }

    #[test]
    fn same_seed_same_order() {
        let image = gradient_image(20, 20);
        let a = sample_chroma(&image, 100, &mut Xoroshiro128PlusPlus::seed_from_u64(7));
        let b = sample_chroma(&image, 100, &mut Xoroshiro128PlusPlus::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn depends_only_on_dimensions() {
        let gradient = gradient_image(16, 9);
        let flat = LabImage::new(vec![palette::Lab::new(40.0, 5.0, 5.0); 16 * 9], 16, 9).unwrap();

        let a = sample_chroma(&gradient, 50, &mut Xoroshiro128PlusPlus::seed_from_u64(3));
        let b = sample_chroma(&flat, 50, &mut Xoroshiro128PlusPlus::seed_from_u64(3));
        assert_eq!(a.coords(), b.coords());
    }

    #[test]
    fn samples_are_distinct_and_match_pixels() {
        let image = gradient_image(32, 32);
        let samples = sample_chroma(&image, 200, &mut Xoroshiro128PlusPlus::seed_from_u64(11));
        assert_eq!(samples.len(), 200);

        let mut coords = samples.coords().to_vec();
        coords.sort_unstable();
        coords.dedup();
        assert_eq!(coords.len(), 200);

        for (&[a, b], &(row, col)) in samples.chroma().iter().zip(samples.coords()) {
            let lab = image.get(row, col);
            #[allow(clippy::float_cmp)]
            {
                assert_eq!([a, b], [lab.a, lab.b]);
            }
        }
    }
}
