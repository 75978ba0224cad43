//! Image loading with the same gray conversion OpenCV applies when it reads a
//! color file as grayscale.

use crate::{Error, Result};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use std::path::Path;

/// BT.601 luma weights in 14-bit fixed point, as used by OpenCV's `cvtColor`.
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;

/// Open `path` and convert it to 8-bit gray.
pub fn load_gray(path: &Path) -> Result<GrayImage> {
    let image = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_owned(),
        source,
    })?;
    Ok(to_gray(image))
}

pub fn to_gray(image: DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray,
        image if !image.color().has_color() => image.to_luma8(),
        image => rgb_to_gray(&image.to_rgb8()),
    }
}

/// `Y = 0.299 R + 0.587 G + 0.114 B`, rounded.
pub fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = u32::from(r) * R_WEIGHT + u32::from(g) * G_WEIGHT + u32::from(b) * B_WEIGHT;
        Luma([((luma + (1 << (SHIFT - 1))) >> SHIFT) as u8])
    })
}
