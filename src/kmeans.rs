//! Best-of-N Lloyd's k-means over chroma points.
//!
//! Each attempt seeds its centers with k-means++ and then alternates assignment and update
//! steps until the compactness (sum of squared distances to the assigned centers) stops improving
//! by at least `epsilon` or `max_iter` update steps have run.
//! The attempt with the lowest compactness is returned.
//!
//! A cluster that loses all of its points keeps its previous center.
//! When there are fewer distinct points than clusters, some centers are duplicates
//! of others and their clusters stay empty.

use crate::{ClusterCount, ConfigError, Error, InputError, Stage};
use log::{debug, trace};
use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_distr::weighted_alias::WeightedAliasIndex;
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::array;
use wide::{f32x8, u32x8, CmpLe};

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// A builder struct to specify the parameters for k-means.
///
/// # Examples
/// ```
/// # use cvd_collisions::KmeansOptions;
/// let options = KmeansOptions::new()
///     .attempts(10)
///     .max_iter(100)
///     .epsilon(0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KmeansOptions {
    /// The number of independent runs, of which the most compact is kept.
    attempts: u32,
    /// The maximum number of update steps per run.
    max_iter: u32,
    /// The minimum compactness improvement needed to keep iterating.
    epsilon: f64,
}

impl Default for KmeansOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl KmeansOptions {
    /// Creates a new [`KmeansOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self { attempts: 5, max_iter: 50, epsilon: 0.5 }
    }

    /// Sets the number of attempts, each with different initial centers.
    ///
    /// The default is `5`.
    #[must_use]
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Sets the maximum number of update steps per attempt.
    ///
    /// The default is `50`.
    #[must_use]
    pub fn max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the compactness improvement below which an attempt is considered converged.
    ///
    /// The default is `0.5`.
    #[must_use]
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Checks that the options describe a runnable clustering.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if `attempts` or `max_iter` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempts == 0 {
            Err(ConfigError::ZeroAttempts)
        } else if self.max_iter == 0 {
            Err(ConfigError::ZeroIterations)
        } else {
            Ok(())
        }
    }
}

/// The result of clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// The `[a, b]` center of each cluster, in cluster id order.
    pub centers: Vec<[f32; 2]>,
    /// The cluster id of each point, in point order.
    pub labels: Vec<u8>,
    /// The sum of squared distances from each point to its center.
    pub compactness: f64,
}

impl Clustering {
    /// The number of points assigned to each cluster.
    #[must_use]
    pub fn counts(&self) -> Vec<u32> {
        let mut counts = vec![0; self.centers.len()];
        for &label in &self.labels {
            counts[usize::from(label)] += 1;
        }
        counts
    }
}

/// Squared euclidean distance between two points.
#[inline]
fn squared_distance(x: [f32; 2], y: [f32; 2]) -> f32 {
    let da = x[0] - y[0];
    let db = x[1] - y[1];
    da * da + db * db
}

/// Returns the `(chunk, lane)` of the center in `points` nearest to `query`.
#[inline]
fn simd_argmin<const N: usize>(points: &[[f32x8; N]], query: [f32; N]) -> (u8, u8) {
    let incr = u32x8::ONE;
    let mut cur_chunk = u32x8::ZERO;
    let mut min_chunk = cur_chunk;
    let mut min_distance = f32x8::splat(f32::INFINITY);

    let query = query.map(f32x8::splat);

    for chunk in points {
        #[allow(clippy::unwrap_used)]
        let distance = array::from_fn::<_, N, _>(|i| {
            let diff = query[i] - chunk[i];
            diff * diff
        })
        .into_iter()
        .reduce(|a, b| a + b)
        .unwrap();

        #[allow(unsafe_code)]
        let mask: u32x8 = unsafe { std::mem::transmute(distance.cmp_le(min_distance)) };
        min_chunk = mask.blend(cur_chunk, min_chunk);
        min_distance = min_distance.fast_min(distance);
        cur_chunk += incr;
    }

    let mut min_lane = 0;
    let mut min_dist = f32::INFINITY;
    for (i, &v) in min_distance.as_array_ref().iter().enumerate() {
        if v < min_dist {
            min_dist = v;
            min_lane = i;
        }
    }

    let min_chunk = min_chunk.as_array_ref()[min_lane];

    #[allow(clippy::cast_possible_truncation)]
    {
        (min_chunk as u8, min_lane as u8)
    }
}

/// Packs centers into SIMD lanes, 8 centers per chunk.
///
/// Unused lanes in the last chunk are set to infinity so they are never the nearest.
fn pack_centers(centers: &[[f32; 2]]) -> Vec<[f32x8; 2]> {
    let chunks = centers.chunks_exact(8);
    let mut packed = Vec::with_capacity(centers.len().div_ceil(8));
    packed.extend(
        chunks
            .clone()
            .map(|chunk| array::from_fn(|i| f32x8::new(array::from_fn(|j| chunk[j][i])))),
    );

    if !chunks.remainder().is_empty() {
        let mut arr = [[f32::INFINITY; 8]; 2];
        for (i, center) in chunks.remainder().iter().enumerate() {
            for (arr, &c) in arr.iter_mut().zip(center) {
                arr[i] = c;
            }
        }
        packed.push(arr.map(f32x8::new));
    }

    packed
}

/// Assigns each point to its nearest center, returning the compactness.
fn assign(points: &[[f32; 2]], centers: &[[f32; 2]], labels: &mut [u8]) -> f64 {
    let packed = pack_centers(centers);
    let mut compactness = 0.0;
    for (label, &point) in labels.iter_mut().zip(points) {
        let (chunk, lane) = simd_argmin(&packed, point);
        let i = usize::from(chunk) * 8 + usize::from(lane);
        compactness += f64::from(squared_distance(point, centers[i]));
        #[allow(clippy::cast_possible_truncation)]
        {
            *label = i as u8;
        }
    }
    compactness
}

/// Moves each center to the mean of its assigned points. Empty clusters are left unchanged.
fn update(points: &[[f32; 2]], labels: &[u8], centers: &mut [[f32; 2]]) {
    let mut sums = vec![[0.0f64; 2]; centers.len()];
    let mut counts = vec![0u32; centers.len()];
    for (&label, &[a, b]) in labels.iter().zip(points) {
        let i = usize::from(label);
        sums[i][0] += f64::from(a);
        sums[i][1] += f64::from(b);
        counts[i] += 1;
    }

    for ((center, sum), count) in centers.iter_mut().zip(sums).zip(counts) {
        if count > 0 {
            let n = f64::from(count);
            #[allow(clippy::cast_possible_truncation)]
            {
                *center = [(sum[0] / n) as f32, (sum[1] / n) as f32];
            }
        }
    }
}

/// Picks `k` initial centers from `points` with k-means++ seeding.
fn plus_plus_centers(points: &[[f32; 2]], k: usize, rng: &mut impl Rng) -> Vec<[f32; 2]> {
    let mut centers = Vec::with_capacity(k);
    centers.push(points[rng.gen_range(0..points.len())]);

    let mut nearest = points
        .iter()
        .map(|&p| f64::from(squared_distance(p, centers[0])))
        .collect::<Vec<_>>();

    while centers.len() < k {
        // fails when every weight is zero, i.e. all distinct points are already centers
        let next = match WeightedAliasIndex::new(nearest.clone()) {
            Ok(distribution) => rng.sample(distribution),
            Err(_) => rng.gen_range(0..points.len()),
        };

        let center = points[next];
        for (d, &p) in nearest.iter_mut().zip(points) {
            *d = d.min(f64::from(squared_distance(p, center)));
        }
        centers.push(center);
    }

    centers
}

/// Runs a single k-means attempt with its own generator.
fn attempt(points: &[[f32; 2]], k: usize, options: KmeansOptions, seed: u64) -> Clustering {
    let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(seed);
    let mut centers = plus_plus_centers(points, k, rng);
    let mut labels = vec![0; points.len()];

    let mut compactness = assign(points, &centers, &mut labels);
    for iter in 0..options.max_iter {
        update(points, &labels, &mut centers);
        let next = assign(points, &centers, &mut labels);
        let improvement = compactness - next;
        compactness = next;
        if improvement < options.epsilon {
            trace!("attempt converged after {} iterations", iter + 1);
            break;
        }
    }

    Clustering { centers, labels, compactness }
}

/// Validates the inputs and draws one seed per attempt from `rng`.
fn prepare(
    points: &[[f32; 2]],
    k: ClusterCount,
    options: KmeansOptions,
    rng: &mut impl Rng,
) -> Result<Vec<u64>, Error> {
    options.validate()?;

    let clusters = k.as_usize();
    if clusters == 0 {
        return Err(Error::input(Stage::Clustering, InputError::ZeroClusters));
    }
    if clusters > points.len() {
        return Err(Error::input(
            Stage::Clustering,
            InputError::TooManyClusters { clusters, points: points.len() },
        ));
    }
    if let Some(index) = points.iter().position(|p| !(p[0].is_finite() && p[1].is_finite())) {
        return Err(Error::Numeric { stage: Stage::Clustering, index });
    }

    Ok((0..options.attempts).map(|_| rng.gen()).collect())
}

/// Keeps the most compact of the attempts. Ties go to the earliest attempt.
fn best(attempts: impl IntoIterator<Item = Clustering>) -> Clustering {
    #[allow(clippy::unwrap_used)]
    let best = attempts
        .into_iter()
        .enumerate()
        .inspect(|(i, c)| trace!("attempt {i} compactness {:.3}", c.compactness))
        .min_by_key(|(i, c)| (OrderedFloat(c.compactness), *i))
        // validated to have at least one attempt
        .unwrap();

    debug!("kept attempt {} with compactness {:.3}", best.0, best.1.compactness);
    best.1
}

/// Partitions `points` into `k` clusters, keeping the best of several k-means attempts.
///
/// The returned clustering has exactly `k` centers and one label in `0..k` per point.
/// Running this twice with the same points, options and generator state gives the same result.
///
/// # Errors
/// Returns an error if `k` is zero, if `k` is greater than the number of points,
/// if a point is not finite, or if `options` is invalid.
pub fn cluster(
    points: &[[f32; 2]],
    k: ClusterCount,
    options: KmeansOptions,
    rng: &mut impl Rng,
) -> Result<Clustering, Error> {
    let seeds = prepare(points, k, options, rng)?;
    Ok(best(
        seeds
            .into_iter()
            .map(|seed| attempt(points, k.as_usize(), options, seed)),
    ))
}

/// Runs the attempts of [`cluster`] in parallel.
///
/// This gives the same result as [`cluster`] for the same inputs.
///
/// # Errors
/// See [`cluster`].
#[cfg(feature = "threads")]
pub fn cluster_par(
    points: &[[f32; 2]],
    k: ClusterCount,
    options: KmeansOptions,
    rng: &mut impl Rng,
) -> Result<Clustering, Error> {
    let seeds = prepare(points, k, options, rng)?;
    let attempts = seeds
        .into_par_iter()
        .map(|seed| attempt(points, k.as_usize(), options, seed))
        .collect::<Vec<_>>();

    Ok(best(attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn rng(seed: u64) -> Xoroshiro128PlusPlus {
        Xoroshiro128PlusPlus::seed_from_u64(seed)
    }

    #[test]
    fn argmin_matches_naive_search() {
        let k = 19; // use non-multiple of 8 to test remainder handling
        let centers = &test_points(k, 1);
        let packed = pack_centers(centers);

        for &point in &test_points(500, 2) {
            #[allow(clippy::unwrap_used)]
            let expected = centers
                .iter()
                .map(|&c| OrderedFloat(squared_distance(c, point)))
                .min()
                .unwrap()
                .0;

            let (chunk, lane) = simd_argmin(&packed, point);
            let i = usize::from(chunk) * 8 + usize::from(lane);

            #[allow(clippy::float_cmp)]
            {
                assert_eq!(expected, squared_distance(centers[i], point));
            }
        }
    }

    #[test]
    fn returns_k_centers_and_valid_labels() {
        let points = test_points(1000, 3);
        for k in [1u8, 2, 6, 9, 17] {
            let result = cluster(&points, k.into(), KmeansOptions::new(), &mut rng(42)).unwrap();
            assert_eq!(result.centers.len(), usize::from(k));
            assert_eq!(result.labels.len(), points.len());
            assert!(result.labels.iter().all(|&l| l < k));
        }
    }

    #[test]
    fn deterministic_for_same_seed() {
        let points = test_points(800, 4);
        let a = cluster(&points, 6.into(), KmeansOptions::new(), &mut rng(42)).unwrap();
        let b = cluster(&points, 6.into(), KmeansOptions::new(), &mut rng(42)).unwrap();
        assert_eq!(a, b);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_sequential() {
        let points = test_points(800, 5);
        let options = KmeansOptions::new().attempts(7);
        let seq = cluster(&points, 5.into(), options, &mut rng(9)).unwrap();
        let par = cluster_par(&points, 5.into(), options, &mut rng(9)).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn labels_point_to_nearest_center() {
        let points = test_points(600, 6);
        let result = cluster(&points, 8.into(), KmeansOptions::new(), &mut rng(1)).unwrap();

        for (&label, &point) in result.labels.iter().zip(&points) {
            let own = squared_distance(point, result.centers[usize::from(label)]);
            for &center in &result.centers {
                assert!(own <= squared_distance(point, center));
            }
        }
    }

    #[test]
    fn separates_well_spaced_blobs() {
        let blobs = [[-40.0, -40.0], [40.0, -40.0], [0.0, 50.0]];
        let points = blobs
            .iter()
            .flat_map(|&[a, b]| {
                test_points(100, 7)
                    .into_iter()
                    .map(move |[da, db]| [a + da / 20.0, b + db / 20.0])
            })
            .collect::<Vec<_>>();

        let result = cluster(&points, 3.into(), KmeansOptions::new(), &mut rng(42)).unwrap();
        assert_eq!(result.counts(), vec![100, 100, 100]);

        for chunk in result.labels.chunks_exact(100) {
            assert!(chunk.iter().all(|&l| l == chunk[0]));
        }
    }

    #[test]
    fn fewer_distinct_points_than_clusters() {
        let points = [[10.0, 10.0], [10.0, 10.0], [-10.0, 5.0], [-10.0, 5.0], [10.0, 10.0]];
        let result = cluster(&points, 4.into(), KmeansOptions::new(), &mut rng(42)).unwrap();
        assert_eq!(result.centers.len(), 4);
        assert!(result.counts().iter().filter(|&&c| c == 0).count() >= 2);
        assert!(result.compactness.abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_cluster_counts() {
        let points = test_points(5, 8);
        assert!(matches!(
            cluster(&points, 0.into(), KmeansOptions::new(), &mut rng(0)),
            Err(Error::Input { kind: InputError::ZeroClusters, .. })
        ));
        assert!(matches!(
            cluster(&points, 6.into(), KmeansOptions::new(), &mut rng(0)),
            Err(Error::Input {
                stage: Stage::Clustering,
                kind: InputError::TooManyClusters { clusters: 6, points: 5 }
            })
        ));
    }

    #[test]
    fn rejects_zero_attempts() {
        let points = test_points(5, 8);
        assert!(matches!(
            cluster(&points, 2.into(), KmeansOptions::new().attempts(0), &mut rng(0)),
            Err(Error::Config(ConfigError::ZeroAttempts))
        ));
    }

    #[test]
    fn rejects_non_finite_points() {
        let mut points = test_points(10, 8);
        points[3][1] = f32::NAN;
        assert!(matches!(
            cluster(&points, 2.into(), KmeansOptions::new(), &mut rng(0)),
            Err(Error::Numeric { stage: Stage::Clustering, index: 3 })
        ));
    }
}
