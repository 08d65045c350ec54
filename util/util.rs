#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use cvd_collisions::LabImage;
use image::RgbImage;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

pub fn load_images(images: &[PathBuf]) -> Vec<(String, RgbImage)> {
    images
        .iter()
        .map(|path| {
            image::open(path).map(|image| {
                (
                    path.file_name().unwrap().to_owned().into_string().unwrap(),
                    image.into_rgb8(),
                )
            })
        })
        .collect::<Result<_, _>>()
        .expect("loaded each image")
}

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(String, RgbImage)> {
    let mut paths = std::fs::read_dir(dir)
        .expect("read img directory")
        .collect::<Result<Vec<_>, _>>()
        .expect("read each file")
        .iter()
        .map(std::fs::DirEntry::path)
        .collect::<Vec<_>>();

    paths.sort();

    load_images(&paths)
}

/// A smooth gradient over red and green with a fixed amount of blue.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / (width - 1)) as u8,
            (y * 255 / (height - 1)) as u8,
            96,
        ])
    })
}

/// Blocks of flat color picked from a few hues, with some per-pixel noise.
pub fn blocks(width: u32, height: u32, seed: u64) -> RgbImage {
    const HUES: [[u8; 3]; 6] = [
        [180, 80, 40],
        [110, 130, 40],
        [30, 160, 200],
        [200, 40, 120],
        [240, 220, 60],
        [40, 40, 60],
    ];

    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |x, y| {
        let hue = HUES[((x / 64 + y / 64) as usize) % HUES.len()];
        image::Rgb(hue.map(|c| c.saturating_add_signed(rng.gen_range(-8..=8))))
    })
}

pub const IMG_DIR: &str = "img";

pub fn load_image_dir_relative_to_root(dir: impl AsRef<Path>) -> Vec<(String, RgbImage)> {
    // assume current exe path is something like: target/build/deps/current_exe
    let exe = std::env::current_exe().unwrap();
    let root = exe
        .parent()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap();

    let dir = root.join(dir.as_ref());
    if dir.is_dir() {
        load_image_dir(dir)
    } else {
        Vec::new()
    }
}

static BENCH_IMAGES: OnceLock<Vec<(String, LabImage)>> = OnceLock::new();

/// Synthetic images of a few sizes, followed by any images found in the `img` directory.
pub fn load_bench_images() -> Vec<(String, LabImage)> {
    let mut images = vec![
        ("gradient_256".to_owned(), gradient(256, 256)),
        ("blocks_640x480".to_owned(), blocks(640, 480, 0)),
        ("blocks_1920x1080".to_owned(), blocks(1920, 1080, 1)),
    ];

    images.extend(load_image_dir_relative_to_root(IMG_DIR));

    images
        .into_iter()
        .map(|(name, image)| (name, LabImage::from_rgbimage_par(&image).unwrap()))
        .collect()
}

pub fn bench_images() -> &'static [(String, LabImage)] {
    BENCH_IMAGES.get_or_init(load_bench_images)
}
