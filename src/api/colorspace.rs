use crate::{Error, LabImage};
use palette::{IntoColor, Lab, LinSrgb, Srgb};

#[cfg(feature = "threads")]
use rayon::prelude::*;
#[cfg(feature = "image")]
use {
    crate::CvdSimulation,
    image::RgbImage,
    palette::cast::{ComponentsAs, IntoComponents},
    std::path::Path,
};

pub(crate) fn from_srgb(color: Srgb<u8>) -> Lab {
    color.into_linear().into_color()
}

pub(crate) fn to_srgb(color: Lab) -> Srgb<u8> {
    let linear: LinSrgb = color.into_color();
    Srgb::from_linear(linear)
}

pub(crate) fn convert_color_space<FromColor, ToColor>(
    colors: &[FromColor],
    convert: impl Fn(FromColor) -> ToColor,
) -> Vec<ToColor>
where
    FromColor: Copy,
{
    colors.iter().copied().map(convert).collect()
}

#[cfg(feature = "threads")]
pub(crate) fn convert_color_space_par<FromColor, ToColor>(
    colors: &[FromColor],
    convert: impl Fn(FromColor) -> ToColor + Send + Sync,
) -> Vec<ToColor>
where
    FromColor: Copy + Send + Sync,
    ToColor: Send,
{
    colors.par_iter().copied().map(convert).collect()
}

impl LabImage {
    /// Converts row-major sRGB pixels to a [`LabImage`].
    ///
    /// # Errors
    /// Returns an input error if `pixels.len()` is not `width * height` or if the image is empty.
    pub fn from_srgb(pixels: &[Srgb<u8>], width: u32, height: u32) -> Result<Self, Error> {
        Self::new(convert_color_space(pixels, from_srgb), width, height)
    }

    /// Converts row-major sRGB pixels to a [`LabImage`] in parallel.
    ///
    /// # Errors
    /// See [`LabImage::from_srgb`].
    #[cfg(feature = "threads")]
    pub fn from_srgb_par(pixels: &[Srgb<u8>], width: u32, height: u32) -> Result<Self, Error> {
        Self::new(convert_color_space_par(pixels, from_srgb), width, height)
    }

    /// Converts the image back to 8-bit sRGB, clamping out of gamut colors.
    #[must_use]
    pub fn to_srgb(&self) -> Vec<Srgb<u8>> {
        convert_color_space(self.pixels(), to_srgb)
    }

    /// Converts an [`RgbImage`] to a [`LabImage`] in parallel.
    ///
    /// # Errors
    /// Returns an input error if the image is empty.
    #[cfg(all(feature = "image", feature = "threads"))]
    pub fn from_rgbimage_par(image: &RgbImage) -> Result<Self, Error> {
        let (width, height) = image.dimensions();
        Self::from_srgb_par(srgb_pixels(image), width, height)
    }
}

#[cfg(feature = "image")]
impl TryFrom<&RgbImage> for LabImage {
    type Error = Error;

    fn try_from(image: &RgbImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Self::from_srgb(srgb_pixels(image), width, height)
    }
}

/// Views the pixels of an [`RgbImage`] as sRGB colors.
#[cfg(feature = "image")]
fn srgb_pixels(image: &RgbImage) -> &[Srgb<u8>] {
    let pixels = image.pixels().len();
    let buf = &image.as_raw()[..(pixels * 3)];
    buf.components_as()
}

/// Builds an [`RgbImage`] out of row-major sRGB pixels.
#[cfg(feature = "image")]
fn rgbimage(width: u32, height: u32, pixels: Vec<Srgb<u8>>) -> RgbImage {
    #[allow(clippy::unwrap_used)]
    {
        // pixels has one color per pixel of a width x height image,
        // so the buffer is large enough by nature of its construction
        RgbImage::from_vec(width, height, pixels.into_components()).unwrap()
    }
}

/// Opens the image at `path` and converts it to CIELAB.
///
/// # Errors
/// Returns [`Error::Image`] if the file cannot be read or decoded,
/// and an input error if the image is empty.
#[cfg(feature = "image")]
pub fn load_lab_image(path: impl AsRef<Path>) -> Result<LabImage, Error> {
    let image = image::open(path)?.into_rgb8();
    #[cfg(feature = "threads")]
    {
        LabImage::from_rgbimage_par(&image)
    }
    #[cfg(not(feature = "threads"))]
    {
        LabImage::try_from(&image)
    }
}

/// Returns a copy of `image` as it appears under the given simulation.
#[cfg(feature = "image")]
#[must_use]
pub fn simulate_rgbimage(image: &RgbImage, simulation: &CvdSimulation) -> RgbImage {
    let (width, height) = image.dimensions();
    rgbimage(width, height, crate::simulate_srgb(srgb_pixels(image), simulation))
}

/// Returns a copy of `image` as it appears under the given simulation, computed in parallel.
#[cfg(all(feature = "image", feature = "threads"))]
#[must_use]
pub fn simulate_rgbimage_par(image: &RgbImage, simulation: &CvdSimulation) -> RgbImage {
    let (width, height) = image.dimensions();
    rgbimage(width, height, crate::simulate_srgb_par(srgb_pixels(image), simulation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_round_trip() {
        let colors = [
            Srgb::new(0, 0, 0),
            Srgb::new(255, 255, 255),
            Srgb::new(180, 80, 40),
            Srgb::new(12, 200, 77),
        ];
        for color in colors {
            assert_eq!(to_srgb(from_srgb(color)), color);
        }
    }

    #[test]
    fn lab_image_from_srgb() {
        let pixels = vec![Srgb::new(255u8, 255, 255); 6];
        let image = LabImage::from_srgb(&pixels, 2, 3).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 3);
        assert!((image.get(2, 1).l - 100.0).abs() < 1e-3);
        assert!(LabImage::from_srgb(&pixels, 4, 4).is_err());
    }

    #[cfg(feature = "image")]
    #[test]
    fn rgbimage_conversion_keeps_layout() {
        let image = RgbImage::from_fn(3, 2, |x, y| {
            if (x, y) == (2, 1) {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        });
        let lab = LabImage::try_from(&image).unwrap();
        assert!(lab.get(1, 2).a > 50.0);
        assert!(lab.get(0, 0).b < -50.0);
    }

    #[cfg(feature = "image")]
    #[test]
    fn zero_severity_image_simulation_is_identity() {
        use crate::{CvdSimulation, Deficiency, Severity};

        let image = RgbImage::from_fn(8, 8, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([(x * 32) as u8, (y * 32) as u8, 128])
        });
        let simulation = CvdSimulation::new(Deficiency::Deutan, Severity::NONE);
        assert_eq!(simulate_rgbimage(&image, &simulation), image);
    }
}
