//! Contains the pipeline builder, the report, and the image level helpers built on the core stages.

pub(crate) mod colorspace;
mod image_delta;
mod pipeline;
mod report;

pub use image_delta::{delta_stats, DeltaStats};
pub use pipeline::{Analysis, CollisionPipeline, Parameters};
pub use report::Report;

#[cfg(feature = "threads")]
pub use image_delta::delta_stats_par;
#[cfg(feature = "threads")]
pub use pipeline::run_many_par;

#[cfg(feature = "image")]
pub use colorspace::{load_lab_image, simulate_rgbimage};
#[cfg(all(feature = "image", feature = "threads"))]
pub use colorspace::simulate_rgbimage_par;
