//! A library for finding palette colors that become hard to tell apart under a color vision deficiency.
//!
//! `cvd_collisions` extracts a small palette from an image by clustering the chroma of sampled pixels
//! in CIELAB, simulates how that palette appears with a given deficiency,
//! and reports every pair of simulated colors whose CIEDE2000 distance falls below a threshold.
//!
//! # Features
//! To reduce dependencies and compile times, `cvd_collisions` has several `cargo` features
//! that can be turned off or on:
//! - `threads`: exposes parallel versions of most functions via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//! - `cli`: builds the `cvd-collisions` command line tool.
//!
//! # High-Level API
//! To get started, see [`CollisionPipeline`]. Here is an example:
//! ```no_run
//! # use cvd_collisions::{CollisionPipeline, Deficiency, LabImage, Severity};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgb8();
//! let image = LabImage::try_from(&img)?;
//!
//! let analysis = CollisionPipeline::new(&image)
//!     .cluster_count(8.into()) // extract 8 palette colors
//!     .deficiency(Deficiency::Protan)
//!     .severity(Severity::try_from(0.8f32)?)
//!     .threshold(10.0)
//!     .run_par()?;
//!
//! for collision in &analysis.collisions {
//!     println!("{} and {} collide", collision.i, collision.j);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Stages
//! Each stage of the pipeline is also exposed on its own:
//! [`sample_chroma`], [`kmeans::cluster`], [`build_centroids`], [`simulate_palette`],
//! [`distance_matrix`], and [`detect_collisions`].
//!
//! Note that some of the options and functions above require certain features to be enabled.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod centroids;
mod collision;
mod cvd;
mod distance;
mod error;
mod sample;
mod traits;
mod types;

pub mod kmeans;

pub use api::*;
pub use centroids::{build_centroids, median_lightness};
pub use collision::{detect_collisions, validate_threshold, Collision};
pub use cvd::{simulate_palette, simulate_srgb, CvdSimulation, Deficiency, Severity};
pub use distance::{distance_matrix, DistanceMatrix};
pub use error::{ConfigError, Error, InputError, Stage};
pub use kmeans::{Clustering, KmeansOptions};
pub use sample::{sample_chroma, ChromaSamples};
pub use traits::*;
pub use types::*;

#[cfg(feature = "threads")]
pub use cvd::simulate_srgb_par;
#[cfg(feature = "threads")]
pub use distance::distance_matrix_par;

/// The maximum supported number of palette colors is `256`.
pub const MAX_CLUSTERS: u16 = u8::MAX as u16 + 1;

#[cfg(test)]
pub(crate) mod tests {
    use crate::LabImage;
    use palette::{IntoColor, Lab, Srgb};
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    /// Converts an 8-bit sRGB color to Lab.
    pub fn srgb_lab(r: u8, g: u8, b: u8) -> Lab {
        Srgb::new(r, g, b).into_linear().into_color()
    }

    /// Scales `i` in `0..n` onto `0..=255`.
    fn scale(i: u32, n: u32) -> u8 {
        #[allow(clippy::cast_possible_truncation)]
        {
            (i * 255 / (n - 1).max(1)) as u8
        }
    }

    /// An in-gamut image with red increasing across columns and green down rows.
    pub fn gradient_image(width: u32, height: u32) -> LabImage {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| srgb_lab(scale(x, width), scale(y, height), 96)))
            .collect();

        LabImage::new(pixels, width, height).unwrap()
    }

    /// `n` random chroma points in `[-100, 100)`.
    pub fn test_points(n: usize, seed: u64) -> Vec<[f32; 2]> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
        (0..n)
            .map(|_| [rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0)])
            .collect()
    }

    /// A small palette of distinct, in-gamut colors.
    pub fn test_palette() -> Vec<Lab> {
        [
            (180, 80, 40),
            (110, 130, 40),
            (0, 0, 255),
            (255, 255, 0),
            (30, 160, 200),
            (240, 240, 240),
            (60, 20, 90),
        ]
        .into_iter()
        .map(|(r, g, b)| srgb_lab(r, g, b))
        .collect()
    }
}
