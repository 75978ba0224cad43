//! Annotated images with the keypoints of one detector drawn over them.

use crate::{Error, Result};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use kelp_features::KeyPoint;
use std::path::Path;

/// Colors cycled through so that neighbouring keypoints can be told apart.
const PALETTE: [Rgb<u8>; 6] = [
    Rgb([255, 0, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 128, 255]),
    Rgb([255, 255, 0]),
    Rgb([255, 0, 255]),
    Rgb([0, 255, 255]),
];

/// Draw each keypoint as a circle of its size, with a radius pointing along
/// its orientation when it has one.
pub fn render_keypoints(image: &GrayImage, keypoints: &[KeyPoint]) -> RgbImage {
    let mut canvas = DynamicImage::ImageLuma8(image.clone()).to_rgb8();
    for (kp, color) in keypoints.iter().zip(PALETTE.iter().cycle()) {
        let (x, y) = kp.point;
        let radius = (kp.size / 2.0).max(1.0);
        draw_hollow_circle_mut(
            &mut canvas,
            (x.round() as i32, y.round() as i32),
            radius.round() as i32,
            *color,
        );
        if kp.is_oriented() {
            let (sin, cos) = kp.angle.to_radians().sin_cos();
            draw_line_segment_mut(
                &mut canvas,
                (x, y),
                (x + radius * cos, y + radius * sin),
                *color,
            );
        }
    }
    canvas
}

pub fn save_annotated(path: &Path, image: &GrayImage, keypoints: &[KeyPoint]) -> Result<()> {
    render_keypoints(image, keypoints)
        .save(path)
        .map_err(|source| Error::ImageSave {
            path: path.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn circle_and_orientation_are_drawn() {
        let image = GrayImage::from_pixel(40, 40, Luma([0]));
        let mut kp = KeyPoint::new(20.0, 20.0, 20.0);
        kp.angle = 0.0;
        let canvas = render_keypoints(&image, &[kp]);
        assert_eq!(canvas.dimensions(), (40, 40));
        // On the circle.
        assert_ne!(canvas[(20, 10)], Rgb([0, 0, 0]));
        // Along the orientation line.
        assert_ne!(canvas[(25, 20)], Rgb([0, 0, 0]));
        // Inside the circle but off the line.
        assert_eq!(canvas[(20, 15)], Rgb([0, 0, 0]));
    }

    #[test]
    fn unoriented_keypoints_have_no_line() {
        let image = GrayImage::from_pixel(40, 40, Luma([0]));
        let canvas = render_keypoints(&image, &[KeyPoint::new(20.0, 20.0, 20.0)]);
        assert_eq!(canvas[(25, 20)], Rgb([0, 0, 0]));
    }

    #[test]
    fn gray_is_kept_where_nothing_is_drawn() {
        let image = GrayImage::from_pixel(8, 8, Luma([77]));
        let canvas = render_keypoints(&image, &[]);
        assert!(canvas.pixels().all(|p| *p == Rgb([77, 77, 77])));
    }
}
