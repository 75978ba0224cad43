//! The CSV files written by the pipeline.
//!
//! Values are written with `Display`, so floats use the shortest
//! representation that round-trips.

use crate::stats::{Detection, DetectionList};
use crate::{Error, Result};
use kelp_features::KeyPoint;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const IMAGE_STATS_HEADER: &str = "detector,keypoints,r_min,r_max,r_mean,r_stddev,ms";
pub const TIMING_HEADER: &str = "detector,keypoints,ms";
pub const KEYPOINTS_HEADER: &str = "x,y,size,angle,response,octave";
pub const DIRECTORY_STATS_HEADER: &str = "path,detector,d_num,f_mean,r_min,r_max,r_mean,r_std";

/// A CSV file being written. I/O errors carry the file path.
pub struct CsvFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CsvFile {
    /// Create (or truncate) `path` and write the header line.
    pub fn create(path: impl Into<PathBuf>, header: &str) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(Error::io(&path))?;
        let mut csv = Self {
            path,
            writer: BufWriter::new(file),
        };
        csv.write_row(header)?;
        Ok(csv)
    }

    pub fn write_row(&mut self, row: &str) -> Result<()> {
        writeln!(self.writer, "{}", row).map_err(Error::io(&self.path))
    }

    /// Flush buffered rows so write errors are not lost on drop.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush().map_err(Error::io(&self.path))
    }
}

/// A row of `<stem>_stats.csv`.
pub fn image_stats_row(detection: &Detection) -> String {
    let r = detection.stats();
    format!(
        "{},{},{},{},{},{},{}",
        detection.detector,
        detection.keypoints(),
        r.min,
        r.max,
        r.mean,
        r.stdev,
        detection.ms()
    )
}

/// A row of `<stem>_stats.csv` in timing-only mode.
pub fn timing_row(detection: &Detection) -> String {
    format!(
        "{},{},{}",
        detection.detector,
        detection.keypoints(),
        detection.ms()
    )
}

pub fn keypoint_row(keypoint: &KeyPoint) -> String {
    format!(
        "{},{},{},{},{},{}",
        keypoint.point.0,
        keypoint.point.1,
        keypoint.size,
        keypoint.angle,
        keypoint.response,
        keypoint.octave
    )
}

/// Write every keypoint of one detection to `path`.
pub fn write_keypoints(path: impl Into<PathBuf>, keypoints: &[KeyPoint]) -> Result<()> {
    let mut csv = CsvFile::create(path, KEYPOINTS_HEADER)?;
    for keypoint in keypoints {
        csv.write_row(&keypoint_row(keypoint))?;
    }
    csv.finish()
}

/// The `stats.csv` row of a single image. A detection without keypoints is
/// all zero, including `d_num`.
pub fn detection_row(detection: &Detection) -> String {
    let path = detection.path.display();
    if detection.responses.is_empty() {
        return format!("{},{},0,0,0,0,0,0", path, detection.detector);
    }
    let r = detection.stats();
    format!(
        "{},{},1,{},{},{},{},{}",
        path,
        detection.detector,
        detection.keypoints(),
        r.min,
        r.max,
        r.mean,
        r.stdev
    )
}

/// The `<dir>/**` row of `stats.csv`.
pub fn directory_row(list: &DetectionList) -> String {
    let path = list.path();
    if list.d_num() == 0 {
        return format!("{},{},0,0,0,0,0,0", path.display(), list.detector);
    }
    let r = list.stats();
    format!(
        "{},{},{},{},{},{},{},{}",
        path.display(),
        list.detector,
        list.d_num(),
        list.f_mean(),
        r.min,
        r.max,
        r.mean,
        r.stdev
    )
}

/// Header of `features_by_detector.csv`, one count column per detector.
pub fn counts_header(detectors: &[impl AsRef<str>]) -> String {
    let mut header = String::from("image,patch");
    for detector in detectors {
        header.push(',');
        header.push_str(detector.as_ref());
    }
    header
}

/// A `features_by_detector.csv` row: file name, parent directory name and
/// the keypoint counts.
pub fn counts_row(image_path: &Path, counts: &[usize]) -> String {
    let name = |path: Option<&Path>| {
        path.and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let mut row = format!("{},{}", name(Some(image_path)), name(image_path.parent()));
    for count in counts {
        row.push_str(&format!(",{}", count));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn keypoints(responses: &[f32]) -> Vec<KeyPoint> {
        responses
            .iter()
            .map(|&r| KeyPoint::new(1.5, 2.0, 7.0).with_response(r))
            .collect()
    }

    #[test]
    fn image_rows() {
        let detection = Detection::new(
            "in/a.jpg",
            "ORB",
            &keypoints(&[1.0, 3.0]),
            Duration::from_millis(12),
        );
        assert_eq!(image_stats_row(&detection), "ORB,2,1,3,2,1,12");
        assert_eq!(timing_row(&detection), "ORB,2,12");
        assert_eq!(detection_row(&detection), "in/a.jpg,ORB,1,2,1,3,2,1");
    }

    #[test]
    fn empty_detection_rows_are_zero() {
        let detection = Detection::new("in/a.jpg", "MSER", &[], Duration::from_millis(3));
        assert_eq!(image_stats_row(&detection), "MSER,0,0,0,0,0,3");
        assert_eq!(detection_row(&detection), "in/a.jpg,MSER,0,0,0,0,0,0");
    }

    #[test]
    fn directory_rows() {
        let mut list = DetectionList::new("in", "SIFT");
        assert_eq!(directory_row(&list), "in/**,SIFT,0,0,0,0,0,0");
        list.add(&Detection::new("in/a.jpg", "SIFT", &keypoints(&[2.0]), Duration::ZERO));
        list.add(&Detection::new("in/b.jpg", "SIFT", &[], Duration::ZERO));
        assert_eq!(directory_row(&list), "in/**,SIFT,2,0.5,2,2,2,0");
    }

    #[test]
    fn keypoint_rows() {
        let mut kp = KeyPoint::new(1.5, 2.0, 7.0).with_response(0.25);
        assert_eq!(keypoint_row(&kp), "1.5,2,7,-1,0.25,0");
        kp.angle = 90.0;
        kp.octave = -1;
        assert_eq!(keypoint_row(&kp), "1.5,2,7,90,0.25,-1");
    }

    #[test]
    fn count_table() {
        assert_eq!(counts_header(&["SIFT", "ORB"]), "image,patch,SIFT,ORB");
        assert_eq!(
            counts_row(Path::new("train/BR_fucus/x.jpg"), &[4, 0]),
            "x.jpg,BR_fucus,4,0"
        );
    }
}
