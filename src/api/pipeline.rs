use super::Report;
use crate::{
    build_centroids, detect_collisions, distance_matrix, kmeans, sample_chroma, simulate_palette,
    validate_threshold, Ciede2000, ClusterCount, Clustering, Collision, CvdSimulation, Deficiency,
    DistanceMatrix, Error, KmeansOptions, LabImage, Severity,
};
use log::{debug, info};
use palette::Lab;
use rand::SeedableRng;
use rand_xoshiro::Xoroshiro128PlusPlus;

#[cfg(feature = "threads")]
use crate::distance_matrix_par;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// The parameters an [`Analysis`] was computed with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    /// The number of palette colors.
    pub clusters: ClusterCount,
    /// The simulated deficiency.
    pub deficiency: Deficiency,
    /// The severity of the simulated deficiency.
    pub severity: Severity,
    /// The distance below which two simulated colors collide.
    pub threshold: f32,
    /// The maximum number of pixels sampled for clustering.
    pub max_samples: usize,
    /// The seed of the random number generator.
    pub seed: u64,
}

/// The artifacts of a [`CollisionPipeline`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// The parameters used for this run.
    pub params: Parameters,
    /// The palette extracted from the image, one color per cluster.
    pub palette: Vec<Lab>,
    /// The palette as it appears under the simulated deficiency, in the same order as `palette`.
    pub simulated: Vec<Lab>,
    /// The CIEDE2000 distances between the simulated colors.
    pub distances: DistanceMatrix,
    /// The pairs of simulated colors closer than the threshold.
    pub collisions: Vec<Collision>,
}

impl Analysis {
    /// Returns whether any pair of palette colors collides.
    #[must_use]
    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }

    /// Returns a human readable summary of this analysis which implements [`Display`](std::fmt::Display).
    #[must_use]
    pub fn report(&self) -> Report<'_> {
        Report::new(self)
    }
}

/// A builder struct to configure and run a palette collision analysis.
///
/// The pipeline samples chroma values from the image, clusters them into a palette,
/// simulates the palette under a color vision deficiency, and reports the pairs of simulated colors
/// whose CIEDE2000 distance falls below the threshold.
///
/// # Examples
/// ```
/// # use cvd_collisions::{CollisionPipeline, Deficiency, LabImage, Severity};
/// # use palette::Srgb;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pixels = (0..64)
///     .map(|i| if i % 8 < 4 { Srgb::new(180, 80, 40) } else { Srgb::new(110, 130, 40) })
///     .collect::<Vec<_>>();
/// let image = LabImage::from_srgb(&pixels, 8, 8)?;
///
/// let analysis = CollisionPipeline::new(&image)
///     .cluster_count(2.into())
///     .deficiency(Deficiency::Deutan)
///     .severity(Severity::FULL)
///     .threshold(8.0)
///     .run()?;
///
/// assert_eq!(analysis.collisions.len(), 1);
/// println!("{}", analysis.report());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CollisionPipeline<'a> {
    /// The image to analyze.
    image: &'a LabImage,
    /// The number of palette colors.
    k: ClusterCount,
    /// The simulated deficiency.
    deficiency: Deficiency,
    /// The severity of the simulated deficiency.
    severity: Severity,
    /// The collision threshold.
    threshold: f32,
    /// The sample cap.
    max_samples: usize,
    /// The seed for sampling and clustering.
    seed: u64,
    /// The k-means parameters.
    kmeans: KmeansOptions,
}

impl<'a> CollisionPipeline<'a> {
    /// Creates a new [`CollisionPipeline`] with default parameters.
    #[must_use]
    pub fn new(image: &'a LabImage) -> Self {
        Self {
            image,
            k: ClusterCount::default(),
            deficiency: Deficiency::default(),
            severity: Severity::default(),
            threshold: 8.0,
            max_samples: 50_000,
            seed: 42,
            kmeans: KmeansOptions::new(),
        }
    }

    /// Sets the number of colors in the extracted palette.
    ///
    /// The default is `6`.
    #[must_use]
    pub fn cluster_count(mut self, k: ClusterCount) -> Self {
        self.k = k;
        self
    }

    /// Sets the deficiency to simulate.
    ///
    /// The default is [`Deficiency::Deutan`].
    #[must_use]
    pub fn deficiency(mut self, deficiency: Deficiency) -> Self {
        self.deficiency = deficiency;
        self
    }

    /// Sets the severity of the simulated deficiency.
    ///
    /// The default is [`Severity::FULL`].
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the CIEDE2000 distance below which two simulated palette colors collide.
    ///
    /// The default is `8.0`.
    #[must_use]
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the maximum number of pixels to sample for clustering.
    ///
    /// The default is `50_000`.
    #[must_use]
    pub fn max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Sets the seed value for the random number generator.
    ///
    /// The default seed is `42`.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the parameters for k-means.
    #[must_use]
    pub fn kmeans_options(mut self, options: KmeansOptions) -> Self {
        self.kmeans = options;
        self
    }

    /// The parameters this pipeline runs with.
    #[must_use]
    pub fn params(&self) -> Parameters {
        Parameters {
            clusters: self.k,
            deficiency: self.deficiency,
            severity: self.severity,
            threshold: self.threshold,
            max_samples: self.max_samples,
            seed: self.seed,
        }
    }

    /// Runs the analysis.
    ///
    /// # Errors
    /// Returns an error naming the failed stage if a parameter is invalid,
    /// if the cluster count is zero or larger than the number of samples,
    /// or if a non-finite value shows up along the way.
    pub fn run(&self) -> Result<Analysis, Error> {
        self.run_with(
            |points, k, options, rng| kmeans::cluster(points, k, options, rng),
            |colors| distance_matrix(colors, &Ciede2000),
        )
    }

    /// Runs the analysis in parallel.
    ///
    /// This gives the same result as [`CollisionPipeline::run`].
    ///
    /// # Errors
    /// See [`CollisionPipeline::run`].
    #[cfg(feature = "threads")]
    pub fn run_par(&self) -> Result<Analysis, Error> {
        self.run_with(
            |points, k, options, rng| kmeans::cluster_par(points, k, options, rng),
            |colors| distance_matrix_par(colors, &Ciede2000),
        )
    }

    /// Runs the stages in order with the given clustering and distance functions.
    fn run_with(
        &self,
        cluster: impl FnOnce(
            &[[f32; 2]],
            ClusterCount,
            KmeansOptions,
            &mut Xoroshiro128PlusPlus,
        ) -> Result<Clustering, Error>,
        distances: impl FnOnce(&[Lab]) -> Result<DistanceMatrix, Error>,
    ) -> Result<Analysis, Error> {
        let threshold = validate_threshold(self.threshold)?;
        self.kmeans.validate()?;

        info!(
            "analyzing {}x{} image with {} clusters under {} at severity {}",
            self.image.width(),
            self.image.height(),
            self.k,
            self.deficiency,
            self.severity,
        );

        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(self.seed);

        let samples = sample_chroma(self.image, self.max_samples, &mut rng);
        let clustering = cluster(samples.chroma(), self.k, self.kmeans, &mut rng)?;
        let empty = clustering.counts().iter().filter(|&&n| n == 0).count();
        debug!("clustered {} samples, {empty} clusters are empty", samples.len());

        let palette = build_centroids(
            self.image,
            &samples.lightness(self.image),
            &clustering.labels,
            &clustering.centers,
        )?;

        let simulation = CvdSimulation::new(self.deficiency, self.severity);
        let simulated = simulate_palette(&palette, &simulation)?;
        let distances = distances(&simulated)?;
        let collisions = detect_collisions(&distances, threshold)?;

        info!("found {} collisions below {threshold}", collisions.len());

        Ok(Analysis {
            params: self.params(),
            palette,
            simulated,
            distances,
            collisions,
        })
    }
}

/// Runs independent pipelines in parallel, returning their results in the same order.
#[cfg(feature = "threads")]
#[must_use]
pub fn run_many_par(pipelines: &[CollisionPipeline<'_>]) -> Vec<Result<Analysis, Error>> {
    pipelines.par_iter().map(CollisionPipeline::run).collect()
}
