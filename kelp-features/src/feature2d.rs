use crate::descriptors::{DescriptorLayout, Descriptors};
use crate::mat::{gray_to_mat, keypoints_from_cv};
use crate::{Detector, KeyPoint, Result};
use image::GrayImage;
use log::*;
use opencv::core::{no_array, Mat, Ptr, Vector};
use opencv::features2d::Feature2D;
use opencv::prelude::*;

/// The name OpenCV gives an algorithm, without its `Feature2D.` prefix.
fn default_name(algorithm: &Ptr<Feature2D>) -> Result<String> {
    let name = Feature2DTraitConst::get_default_name(algorithm)?;
    Ok(name
        .strip_prefix("Feature2D.")
        .map(str::to_owned)
        .unwrap_or(name))
}

fn detect_with(inner: &mut Ptr<Feature2D>, name: &str, image: &GrayImage) -> Result<Vec<KeyPoint>> {
    let mat = gray_to_mat(image)?;
    let mut keypoints = Vector::new();
    inner.detect(&mat, &mut keypoints, &no_array())?;
    trace!("{} found {} keypoints", name, keypoints.len());
    Ok(keypoints_from_cv(&keypoints))
}

/// An OpenCV algorithm that detects keypoints and describes them in one pass.
pub struct DetectAndCompute {
    inner: Ptr<Feature2D>,
    name: String,
    layout: DescriptorLayout,
}

impl DetectAndCompute {
    pub fn new(inner: impl Into<Ptr<Feature2D>>, layout: DescriptorLayout) -> Result<Self> {
        let inner = inner.into();
        let name = default_name(&inner)?;
        Ok(Self {
            inner,
            name,
            layout,
        })
    }
}

impl Detector for DetectAndCompute {
    fn name(&self) -> &str {
        &self.name
    }

    fn computes_descriptors(&self) -> bool {
        true
    }

    fn detect(&mut self, image: &GrayImage) -> Result<Vec<KeyPoint>> {
        detect_with(&mut self.inner, &self.name, image)
    }

    fn detect_and_compute(
        &mut self,
        image: &GrayImage,
    ) -> Result<(Vec<KeyPoint>, Option<Descriptors>)> {
        let mat = gray_to_mat(image)?;
        let mut keypoints = Vector::new();
        let mut descriptors = Mat::default();
        self.inner
            .detect_and_compute(&mat, &no_array(), &mut keypoints, &mut descriptors, false)?;
        trace!(
            "{} described {} keypoints with {}x{} descriptors",
            self.name,
            keypoints.len(),
            descriptors.rows(),
            descriptors.cols()
        );
        let descriptors = Descriptors::from_mat(&self.name, self.layout, &descriptors)?;
        Ok((keypoints_from_cv(&keypoints), Some(descriptors)))
    }
}

/// An OpenCV algorithm that only detects keypoints.
pub struct DetectOnly {
    inner: Ptr<Feature2D>,
    name: String,
}

impl DetectOnly {
    pub fn new(inner: impl Into<Ptr<Feature2D>>) -> Result<Self> {
        let inner = inner.into();
        let name = default_name(&inner)?;
        Ok(Self { inner, name })
    }
}

impl Detector for DetectOnly {
    fn name(&self) -> &str {
        &self.name
    }

    fn computes_descriptors(&self) -> bool {
        false
    }

    fn detect(&mut self, image: &GrayImage) -> Result<Vec<KeyPoint>> {
        detect_with(&mut self.inner, &self.name, image)
    }
}
