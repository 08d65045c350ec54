#[path = "../util/util.rs"]
mod util;

use util::bench_images;

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use cvd_collisions::{
    distance_matrix, distance_matrix_par, kmeans, sample_chroma, simulate_palette, Ciede2000,
    ClusterCount, CollisionPipeline, CvdSimulation, Deficiency, KmeansOptions, LabImage, Severity,
};
use palette::Lab;
use rand::SeedableRng;
use rand_xoshiro::Xoroshiro128PlusPlus;

const MAX_SAMPLES: usize = 50_000;

fn bench(
    c: &mut Criterion,
    group: &str,
    mut f: impl FnMut(&mut Bencher<WallTime>, &(ClusterCount, &LabImage)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (k, secs) in [(ClusterCount::from(32), 4), (16.into(), 3), (6.into(), 2)] {
        group.measurement_time(Duration::from_secs(secs));
        for (name, image) in bench_images() {
            group.bench_with_input(
                BenchmarkId::new(k.to_string(), name),
                &(k, image),
                &mut f,
            );
        }
    }
}

fn samples(image: &LabImage) -> Vec<[f32; 2]> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(0);
    sample_chroma(image, MAX_SAMPLES, &mut rng).chroma().to_vec()
}

fn sample_single(c: &mut Criterion) {
    bench(c, "sample_single", |b, &(_, image)| {
        b.iter(|| {
            let mut rng = Xoroshiro128PlusPlus::seed_from_u64(0);
            sample_chroma(image, MAX_SAMPLES, &mut rng)
        })
    })
}

fn kmeans_single(c: &mut Criterion) {
    bench(c, "kmeans_single", |b, &(k, image)| {
        let points = samples(image);
        b.iter(|| {
            let mut rng = Xoroshiro128PlusPlus::seed_from_u64(0);
            kmeans::cluster(&points, k, KmeansOptions::new(), &mut rng)
        })
    })
}

fn kmeans_par(c: &mut Criterion) {
    bench(c, "kmeans_par", |b, &(k, image)| {
        let points = samples(image);
        b.iter(|| {
            let mut rng = Xoroshiro128PlusPlus::seed_from_u64(0);
            kmeans::cluster_par(&points, k, KmeansOptions::new(), &mut rng)
        })
    })
}

/// A simulated palette of `k` colors drawn from the image.
fn simulated_palette(k: ClusterCount, image: &LabImage) -> Vec<Lab> {
    let step = (image.num_pixels() / k.as_usize()).max(1);
    let palette = image
        .pixels()
        .iter()
        .step_by(step)
        .take(k.as_usize())
        .copied()
        .collect::<Vec<_>>();

    let simulation = CvdSimulation::new(Deficiency::Deutan, Severity::FULL);
    simulate_palette(&palette, &simulation).unwrap()
}

fn distances_single(c: &mut Criterion) {
    bench(c, "distances_single", |b, &(k, image)| {
        let palette = simulated_palette(k, image);
        b.iter(|| distance_matrix(&palette, &Ciede2000))
    })
}

fn distances_par(c: &mut Criterion) {
    bench(c, "distances_par", |b, &(k, image)| {
        let palette = simulated_palette(k, image);
        b.iter(|| distance_matrix_par(&palette, &Ciede2000))
    })
}

fn pipeline_single(c: &mut Criterion) {
    bench(c, "pipeline_single", |b, &(k, image)| {
        let pipeline = CollisionPipeline::new(image).cluster_count(k);
        b.iter(|| pipeline.run())
    })
}

fn pipeline_par(c: &mut Criterion) {
    bench(c, "pipeline_par", |b, &(k, image)| {
        let pipeline = CollisionPipeline::new(image).cluster_count(k);
        b.iter(|| pipeline.run_par())
    })
}

criterion_group!(
    benches,
    sample_single,
    kmeans_single,
    kmeans_par,
    distances_single,
    distances_par,
    pipeline_single,
    pipeline_par
);
criterion_main!(benches);
