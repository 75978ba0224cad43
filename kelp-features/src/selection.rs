use crate::{DescriptorLayout, DetectAndCompute, DetectOnly, Detector, Error, Result};
use log::*;
use opencv::features2d::{
    AgastFeatureDetector, FastFeatureDetector, GFTTDetector, SimpleBlobDetector, AKAZE, BRISK,
    MSER, ORB, SIFT,
};
use opencv::prelude::*;

/// Every OpenCV detector this crate wraps, in the order they are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Sift,
    Brisk,
    Orb,
    Akaze,
    Mser,
    Fast,
    SimpleBlob,
    Agast,
    Gftt,
}

/// Accepted values of a detector type argument.
pub const DETECTOR_TYPES: &[&str] = &[
    "SIFT",
    "BRISK",
    "ORB",
    "AKAZE",
    "MSER",
    "FAST",
    "SimpleBlobDetector",
    "blob",
    "AgastFeatureDetector",
    "Agast",
    "GFTTDetector",
    "GFTT",
    "desc",
    "all",
];

impl DetectorKind {
    pub const ALL: [DetectorKind; 9] = [
        DetectorKind::Sift,
        DetectorKind::Brisk,
        DetectorKind::Orb,
        DetectorKind::Akaze,
        DetectorKind::Mser,
        DetectorKind::Fast,
        DetectorKind::SimpleBlob,
        DetectorKind::Agast,
        DetectorKind::Gftt,
    ];

    /// Names that select this detector besides `all`.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            DetectorKind::Sift => &["SIFT", "desc"],
            DetectorKind::Brisk => &["BRISK", "desc"],
            DetectorKind::Orb => &["ORB", "desc"],
            DetectorKind::Akaze => &["AKAZE", "desc"],
            DetectorKind::Mser => &["MSER"],
            DetectorKind::Fast => &["FAST"],
            DetectorKind::SimpleBlob => &["SimpleBlobDetector", "blob"],
            DetectorKind::Agast => &["AgastFeatureDetector", "Agast"],
            DetectorKind::Gftt => &["GFTTDetector", "GFTT"],
        }
    }

    /// Whether `detector_type` selects this detector. Matching is exact.
    pub fn is_selected_by(self, detector_type: &str) -> bool {
        detector_type == "all" || self.aliases().contains(&detector_type)
    }
}

/// Knobs of the selected detectors that can be changed from the command line.
///
/// Everything else keeps the OpenCV defaults.
#[derive(Debug, Clone, Copy)]
pub struct SelectionConfig {
    pub orb_features: usize,
    pub akaze_threshold: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            orb_features: 500,
            akaze_threshold: 0.001,
        }
    }
}

impl SelectionConfig {
    pub fn build(&self, kind: DetectorKind) -> Result<Box<dyn Detector>> {
        debug!("Creating {:?}", kind);
        let detector: Box<dyn Detector> = match kind {
            DetectorKind::Sift => Box::new(DetectAndCompute::new(
                SIFT::create_def()?,
                DescriptorLayout::Float128,
            )?),
            DetectorKind::Brisk => Box::new(DetectAndCompute::new(
                BRISK::create_def()?,
                DescriptorLayout::Binary512,
            )?),
            DetectorKind::Orb => {
                let mut orb = ORB::create_def()?;
                orb.set_max_features(self.orb_features as i32)?;
                Box::new(DetectAndCompute::new(orb, DescriptorLayout::Binary256)?)
            }
            DetectorKind::Akaze => {
                let mut akaze = AKAZE::create_def()?;
                akaze.set_threshold(self.akaze_threshold)?;
                Box::new(DetectAndCompute::new(akaze, DescriptorLayout::Binary512)?)
            }
            DetectorKind::Mser => Box::new(DetectOnly::new(MSER::create_def()?)?),
            DetectorKind::Fast => Box::new(DetectOnly::new(FastFeatureDetector::create_def()?)?),
            DetectorKind::SimpleBlob => {
                Box::new(DetectOnly::new(SimpleBlobDetector::create_def()?)?)
            }
            DetectorKind::Agast => Box::new(DetectOnly::new(AgastFeatureDetector::create_def()?)?),
            DetectorKind::Gftt => Box::new(DetectOnly::new(GFTTDetector::create_def()?)?),
        };
        Ok(detector)
    }
}

/// The kinds `detector_type` selects, in run order.
pub fn kinds(detector_type: &str) -> Result<Vec<DetectorKind>> {
    let kinds: Vec<DetectorKind> = DetectorKind::ALL
        .iter()
        .copied()
        .filter(|kind| kind.is_selected_by(detector_type))
        .collect();
    if kinds.is_empty() {
        return Err(Error::UnknownDetector(detector_type.to_owned()));
    }
    Ok(kinds)
}

/// Detectors with default settings for a detector type argument.
pub fn select(detector_type: &str) -> Result<Vec<Box<dyn Detector>>> {
    select_with(detector_type, &SelectionConfig::default())
}

pub fn select_with(
    detector_type: &str,
    config: &SelectionConfig,
) -> Result<Vec<Box<dyn Detector>>> {
    kinds(detector_type)?
        .into_iter()
        .map(|kind| config.build(kind))
        .collect()
}
