//! Contains various types needed across the crate.

use crate::{Error, InputError, Stage, MAX_CLUSTERS};
use palette::Lab;
use std::{
    error,
    fmt::{Debug, Display},
};

/// An error type for when a value is above the maximum supported value.
///
/// The inner value is the maximum supported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AboveMaxLen<T>(pub T);

impl<T: Display> Display for AboveMaxLen<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "above the maximum length of {}", self.0)
    }
}

impl<T: Debug + Display> error::Error for AboveMaxLen<T> {}

/// An image in the CIELAB color space, stored row-major.
///
/// # Examples
/// Build one directly from Lab pixels:
/// ```
/// # use cvd_collisions::LabImage;
/// # use palette::Lab;
/// # fn main() -> Result<(), cvd_collisions::Error> {
/// let pixels = vec![Lab::new(50.0, 10.0, -10.0); 6];
/// let image = LabImage::new(pixels, 3, 2)?;
/// assert_eq!(image.num_pixels(), 6);
/// # Ok(())
/// # }
/// ```
///
/// Or from an [`image::RgbImage`] (needs the `image` feature to be enabled):
/// ```no_run
/// # use cvd_collisions::LabImage;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let image = LabImage::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LabImage {
    /// The pixels, `width * height` of them.
    pixels: Vec<Lab>,
    /// The number of columns.
    width: u32,
    /// The number of rows.
    height: u32,
}

impl LabImage {
    /// Creates a new [`LabImage`].
    ///
    /// # Errors
    /// Returns an input error if `pixels.len()` is not `width * height` or if the image is empty.
    pub fn new(pixels: Vec<Lab>, width: u32, height: u32) -> Result<Self, Error> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            Err(Error::input(
                Stage::Load,
                InputError::DimensionMismatch { expected, actual: pixels.len() },
            ))
        } else if expected == 0 {
            Err(Error::input(Stage::Load, InputError::EmptyImage))
        } else {
            Ok(Self { pixels, width, height })
        }
    }

    /// The number of columns in the image.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The number of rows in the image.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The total number of pixels, `width * height`.
    #[must_use]
    pub fn num_pixels(&self) -> usize {
        self.pixels.len()
    }

    /// The pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[Lab] {
        &self.pixels
    }

    /// Returns the pixel at the given row and column.
    ///
    /// # Panics
    /// Panics if the coordinate is out of bounds.
    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> Lab {
        assert!(row < self.height && col < self.width);
        self.pixels[row as usize * self.width as usize + col as usize]
    }

    /// Consumes the image, returning its pixels.
    #[must_use]
    pub fn into_pixels(self) -> Vec<Lab> {
        self.pixels
    }
}

/// The number of clusters (palette colors) to extract from an image.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// less than or equal to [`MAX_CLUSTERS`]. A count of zero is representable,
/// but is rejected by the clustering stage.
///
/// # Examples
/// ```
/// # use cvd_collisions::{ClusterCount, AboveMaxLen};
/// # fn main() -> Result<(), AboveMaxLen<u16>> {
/// let count = ClusterCount::from(6);
/// let count: ClusterCount = 128u16.try_into()?;
/// let count = ClusterCount::from_clamped(1024);
/// assert_eq!(count, ClusterCount::MAX);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClusterCount(u16);

impl ClusterCount {
    /// The maximum supported cluster count (given by [`MAX_CLUSTERS`]).
    pub const MAX: Self = Self(MAX_CLUSTERS);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Gets the count as a `usize` for indexing and allocation.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Creates a [`ClusterCount`] by clamping the given `u16` to be less than or equal to [`MAX_CLUSTERS`].
    #[must_use]
    pub const fn from_clamped(value: u16) -> Self {
        if value <= MAX_CLUSTERS {
            Self(value)
        } else {
            Self(MAX_CLUSTERS)
        }
    }
}

impl Default for ClusterCount {
    fn default() -> Self {
        Self(6)
    }
}

impl From<ClusterCount> for u16 {
    fn from(val: ClusterCount) -> Self {
        val.into_inner()
    }
}

impl From<u8> for ClusterCount {
    fn from(value: u8) -> Self {
        Self(value.into())
    }
}

impl TryFrom<u16> for ClusterCount {
    type Error = AboveMaxLen<u16>;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value <= MAX_CLUSTERS {
            Ok(ClusterCount(value))
        } else {
            Err(AboveMaxLen(MAX_CLUSTERS))
        }
    }
}

impl Display for ClusterCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}
