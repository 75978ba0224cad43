//! Response statistics of single detections and of whole directories.

use kelp_features::KeyPoint;
use std::path::PathBuf;
use std::time::Duration;

/// Summary of keypoint responses. All zero when there are none.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Responses {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Population standard deviation.
    pub stdev: f32,
}

impl Responses {
    pub fn from_keypoints(keypoints: &[KeyPoint]) -> Self {
        let values: Vec<f32> = keypoints.iter().map(|kp| kp.response).collect();
        Self::from_values(&values)
    }

    pub fn from_values(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|&v| {
                let diff = f64::from(v) - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;
        Self {
            min,
            max,
            mean: mean as f32,
            stdev: variance.sqrt() as f32,
        }
    }
}

/// One detector run on one image.
#[derive(Debug, Clone)]
pub struct Detection {
    pub path: PathBuf,
    pub detector: String,
    pub responses: Vec<f32>,
    pub elapsed: Duration,
}

impl Detection {
    pub fn new(
        path: impl Into<PathBuf>,
        detector: impl Into<String>,
        keypoints: &[KeyPoint],
        elapsed: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            detector: detector.into(),
            responses: keypoints.iter().map(|kp| kp.response).collect(),
            elapsed,
        }
    }

    pub fn keypoints(&self) -> usize {
        self.responses.len()
    }

    pub fn stats(&self) -> Responses {
        Responses::from_values(&self.responses)
    }

    /// Wall-clock time of the detector call in whole milliseconds.
    pub fn ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Every detection of one detector below a directory.
#[derive(Debug, Clone)]
pub struct DetectionList {
    pub dir: PathBuf,
    pub detector: String,
    responses: Vec<f32>,
    detections: usize,
}

impl DetectionList {
    pub fn new(dir: impl Into<PathBuf>, detector: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            detector: detector.into(),
            responses: vec![],
            detections: 0,
        }
    }

    pub fn add(&mut self, detection: &Detection) {
        debug_assert_eq!(detection.detector, self.detector);
        self.responses.extend_from_slice(&detection.responses);
        self.detections += 1;
    }

    /// Fold in the detections of a subdirectory.
    pub fn add_list(&mut self, list: &DetectionList) {
        debug_assert_eq!(list.detector, self.detector);
        self.responses.extend_from_slice(&list.responses);
        self.detections += list.detections;
    }

    /// The special `<dir>/**` path of the directory row.
    pub fn path(&self) -> PathBuf {
        self.dir.join("**")
    }

    pub fn d_num(&self) -> usize {
        self.detections
    }

    /// Mean number of keypoints per detection.
    pub fn f_mean(&self) -> f32 {
        if self.detections == 0 {
            0.0
        } else {
            self.responses.len() as f32 / self.detections as f32
        }
    }

    pub fn stats(&self) -> Responses {
        Responses::from_values(&self.responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::path::Path;

    fn detection(detector: &str, responses: &[f32]) -> Detection {
        let keypoints: Vec<KeyPoint> = responses
            .iter()
            .map(|&r| KeyPoint::new(0.0, 0.0, 1.0).with_response(r))
            .collect();
        Detection::new("a.jpg", detector, &keypoints, Duration::from_micros(2500))
    }

    #[test]
    fn population_statistics() {
        let r = Responses::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(r.min, 2.0);
        assert_eq!(r.max, 9.0);
        assert_relative_eq!(r.mean, 5.0);
        assert_relative_eq!(r.stdev, 2.0);
    }

    #[test]
    fn empty_responses_are_zero() {
        assert_eq!(Responses::from_keypoints(&[]), Responses::default());
        let r = Responses::from_values(&[3.5]);
        assert_eq!((r.min, r.max, r.mean, r.stdev), (3.5, 3.5, 3.5, 0.0));
    }

    #[test]
    fn milliseconds_truncate() {
        assert_eq!(detection("SIFT", &[1.0]).ms(), 2);
    }

    #[test]
    fn lists_count_detections() {
        let mut child = DetectionList::new("root/child", "ORB");
        child.add(&detection("ORB", &[1.0, 2.0, 3.0]));
        child.add(&detection("ORB", &[]));
        assert_eq!(child.d_num(), 2);
        assert_relative_eq!(child.f_mean(), 1.5);

        let mut root = DetectionList::new("root", "ORB");
        root.add(&detection("ORB", &[5.0]));
        root.add_list(&child);
        assert_eq!(root.d_num(), 3);
        assert_relative_eq!(root.f_mean(), 4.0 / 3.0);
        assert_eq!(root.stats().max, 5.0);
        assert_eq!(root.path(), Path::new("root/**"));
    }

    #[test]
    fn empty_list_is_zero() {
        let list = DetectionList::new("d", "FAST");
        assert_eq!(list.d_num(), 0);
        assert_eq!(list.f_mean(), 0.0);
        assert_eq!(list.stats(), Responses::default());
    }
}
