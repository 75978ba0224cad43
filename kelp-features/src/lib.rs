//! Uniform wrappers over the OpenCV keypoint detectors compared by `kelpbench`.
//!
//! Every detector implements [`Detector`], which exposes a plain `detect` and a
//! `detect_and_compute` that also returns descriptors when the algorithm has
//! them. The set of detectors to run is picked by name with [`select`].
//!
//! The algorithms themselves come from the `features2d` module of OpenCV through
//! the `opencv` crate. This crate only converts images, keypoints and
//! descriptors between OpenCV and plain Rust types.

mod descriptors;
mod feature2d;
mod mat;
mod selection;

pub use crate::descriptors::{DescriptorLayout, Descriptors};
pub use crate::feature2d::{DetectAndCompute, DetectOnly};
pub use crate::mat::{gray_to_mat, keypoint_from_cv};
pub use crate::selection::{kinds, select, select_with, DetectorKind, SelectionConfig, DETECTOR_TYPES};

pub use ::image::GrayImage;

/// A point of interest in an image.
///
/// Mirrors the OpenCV `KeyPoint` so that the CSV output of the different
/// detectors can be compared column by column.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyPoint {
    /// `(x, y)` with +x to the right and +y toward the bottom of the image,
    /// in full resolution pixel coordinates.
    pub point: (f32, f32),
    /// Diameter of the meaningful keypoint neighborhood.
    pub size: f32,
    /// Orientation in degrees in `[0, 360)`, or `-1` when the detector does
    /// not assign one.
    pub angle: f32,
    /// Strength of the detector response. Detectors without a meaningful
    /// response report zero.
    pub response: f32,
    /// Octave as reported by OpenCV. SIFT packs the layer and the octave into
    /// this value.
    pub octave: i32,
    /// Object class, `-1` unless the detector assigns one.
    pub class_id: i32,
}

impl KeyPoint {
    /// An unoriented keypoint with no response.
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            point: (x, y),
            size,
            angle: -1.0,
            response: 0.0,
            octave: 0,
            class_id: -1,
        }
    }

    pub fn with_response(mut self, response: f32) -> Self {
        self.response = response;
        self
    }

    pub fn is_oriented(&self) -> bool {
        self.angle >= 0.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown detector type `{0}`")]
    UnknownDetector(String),
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("{detector} returned {cols} descriptor columns of OpenCV type {typ}")]
    DescriptorLayout {
        detector: String,
        typ: i32,
        cols: i32,
    },
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The uniform interface over all detectors.
///
/// The harness only ever talks to detectors through this trait, so a detector
/// can be swapped for another implementation without touching the pipeline.
/// OpenCV algorithms keep internal buffers, hence `&mut self`.
pub trait Detector {
    /// The detector's name, as used in CSV output and file names.
    fn name(&self) -> &str;

    /// Whether [`Detector::detect_and_compute`] produces descriptors.
    fn computes_descriptors(&self) -> bool;

    /// Find keypoints in an 8-bit grayscale image.
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<KeyPoint>>;

    /// Find keypoints and compute a descriptor for each of them.
    ///
    /// Keypoints that cannot be described are dropped, so when descriptors
    /// are returned there is exactly one per keypoint. Detect-only detectors
    /// return their keypoints and `None`.
    fn detect_and_compute(
        &mut self,
        image: &GrayImage,
    ) -> Result<(Vec<KeyPoint>, Option<Descriptors>)> {
        Ok((self.detect(image)?, None))
    }
}

/// Rejects images the detectors cannot run on.
pub fn check_image(image: &GrayImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keypoint_is_unoriented() {
        let kp = KeyPoint::new(1.0, 2.0, 7.0);
        assert!(!kp.is_oriented());
        assert_eq!(kp.class_id, -1);
        assert_eq!(kp.with_response(3.0).response, 3.0);
    }

    #[test]
    fn empty_images_are_rejected() {
        assert!(matches!(
            check_image(&GrayImage::new(0, 4)),
            Err(Error::EmptyImage { width: 0, height: 4 })
        ));
        assert!(check_image(&GrayImage::new(1, 1)).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn keypoints_are_serializable() {
        fn serializable<T: serde::Serialize + serde::de::DeserializeOwned>() {}
        serializable::<KeyPoint>();
    }
}
