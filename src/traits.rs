//! Traits for the color science the analysis relies on.

use palette::{color_difference::Ciede2000 as _, Lab, LinSrgb};

/// A perceptual distance between two Lab colors.
///
/// Implementations must be symmetric and return `0.0` for identical colors.
pub trait ColorDifference {
    /// Returns the non-negative distance between `a` and `b`.
    fn difference(&self, a: Lab, b: Lab) -> f32;
}

/// The CIEDE2000 color difference formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ciede2000;

impl ColorDifference for Ciede2000 {
    #[inline]
    fn difference(&self, a: Lab, b: Lab) -> f32 {
        a.difference(b)
    }
}

/// Simulates how linear sRGB pixels appear to an observer with a color vision deficiency.
///
/// A palette is simulated by passing it as a single row of pixels.
pub trait DeficiencySimulator {
    /// Replaces each pixel with its simulated appearance, keeping every channel in `0.0..=1.0`.
    fn simulate_pixels(&self, pixels: &mut [LinSrgb]);
}
