use crate::{check_image, KeyPoint, Result};
use image::GrayImage;
use opencv::core::{self, Mat, Scalar, Vector};
use opencv::prelude::*;

/// Copy an 8-bit grayscale image into a single channel `CV_8UC1` matrix.
pub fn gray_to_mat(image: &GrayImage) -> Result<Mat> {
    check_image(image)?;
    let mut mat = Mat::new_rows_cols_with_default(
        image.height() as i32,
        image.width() as i32,
        core::CV_8UC1,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(image.as_raw());
    Ok(mat)
}

pub fn keypoint_from_cv(kp: &core::KeyPoint) -> KeyPoint {
    let pt = kp.pt();
    KeyPoint {
        point: (pt.x, pt.y),
        size: kp.size(),
        angle: kp.angle(),
        response: kp.response(),
        octave: kp.octave(),
        class_id: kp.class_id(),
    }
}

pub(crate) fn keypoints_from_cv(keypoints: &Vector<core::KeyPoint>) -> Vec<KeyPoint> {
    keypoints.iter().map(|kp| keypoint_from_cv(&kp)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use image::Luma;
    use opencv::core::Point2f;

    #[test]
    fn gray_image_keeps_layout() {
        let image = GrayImage::from_fn(5, 3, |x, y| Luma([(10 * y + x) as u8]));
        let mat = gray_to_mat(&image).unwrap();
        assert_eq!((mat.rows(), mat.cols()), (3, 5));
        assert_eq!(mat.typ(), core::CV_8UC1);
        assert_eq!(*mat.at_2d::<u8>(2, 4).unwrap(), 24);
        assert_eq!(*mat.at_2d::<u8>(1, 0).unwrap(), 10);
    }

    #[test]
    fn empty_image_is_not_converted() {
        assert!(matches!(
            gray_to_mat(&GrayImage::new(4, 0)),
            Err(Error::EmptyImage { .. })
        ));
    }

    #[test]
    fn keypoint_fields() {
        let mut cv = core::KeyPoint::default().unwrap();
        cv.set_pt(Point2f::new(12.5, 3.25));
        cv.set_size(7.0);
        cv.set_angle(90.0);
        cv.set_response(0.5);
        cv.set_octave(3 << 8 | 1);
        cv.set_class_id(-1);

        let kp = keypoint_from_cv(&cv);
        assert_eq!(kp.point, (12.5, 3.25));
        assert_eq!(kp.size, 7.0);
        assert!(kp.is_oriented());
        assert_eq!(kp.response, 0.5);
        assert_eq!(kp.octave, 769);
        assert_eq!(kp.class_id, -1);
    }
}
