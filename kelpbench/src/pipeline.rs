use crate::report::{self, CsvFile};
use crate::stats::{Detection, DetectionList};
use crate::{grayscale, render, Error, Result};
use kelp_features::{Detector, GrayImage, SelectionConfig};
use log::*;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What is written besides the per-image statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Save `<stem>_<detector>.jpg` with the keypoints drawn.
    pub annotate: bool,
    /// Save `<stem>_<detector>_keypoints.csv`.
    pub keypoints_csv: bool,
    /// Time `detect_and_compute` instead of `detect`.
    pub compute_descriptors: bool,
    /// Leave the response columns out of `<stem>_stats.csv`.
    pub timing_only: bool,
    /// Write `features_by_detector.csv` in directory mode.
    pub feature_counts: bool,
}

/// Runs an ordered list of detectors over images, one at a time.
pub struct FeaturePipeline {
    detectors: Vec<Box<dyn Detector>>,
    options: PipelineOptions,
}

impl FeaturePipeline {
    pub fn new(detectors: Vec<Box<dyn Detector>>, options: PipelineOptions) -> Self {
        Self { detectors, options }
    }

    /// A pipeline running the detectors selected by `detector_type`.
    pub fn from_detector_type(
        detector_type: &str,
        config: &SelectionConfig,
        options: PipelineOptions,
    ) -> Result<Self> {
        let detectors = kelp_features::select_with(detector_type, config)?;
        Ok(Self::new(detectors, options))
    }

    pub fn detector_names(&self) -> Vec<String> {
        self.detectors.iter().map(|d| d.name().to_owned()).collect()
    }

    /// Run every detector on one image and write its `<stem>_stats.csv`
    /// (plus keypoint CSVs and annotated images when asked) to `output_dir`.
    pub fn process_image(
        &mut self,
        image_path: &Path,
        output_dir: &Path,
    ) -> Result<Vec<Detection>> {
        info!("Open {}", image_path.display());
        let image = grayscale::load_gray(image_path)?;
        kelp_features::check_image(&image)?;

        let stem = image_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = |suffix: &str| output_dir.join(format!("{}_{}", stem, suffix));

        let header = if self.options.timing_only {
            report::TIMING_HEADER
        } else {
            report::IMAGE_STATS_HEADER
        };
        let mut stats = CsvFile::create(output("stats.csv"), header)?;

        let mut detections = Vec::with_capacity(self.detectors.len());
        for detector in &mut self.detectors {
            let name = detector.name().to_owned();
            info!("Start {}", name);

            let start = Instant::now();
            let keypoints = if self.options.compute_descriptors {
                let (keypoints, descriptors) = detector.detect_and_compute(&image)?;
                if let Some(descriptors) = descriptors {
                    debug!(
                        "{} computed {} descriptors of {} bytes",
                        name,
                        descriptors.len(),
                        descriptors.descriptor_bytes()
                    );
                }
                keypoints
            } else {
                detector.detect(&image)?
            };
            let detection =
                Detection::new(image_path, name.as_str(), &keypoints, start.elapsed());
            debug!(
                "{} found {} keypoints in {} ms",
                name,
                detection.keypoints(),
                detection.ms()
            );

            stats.write_row(&if self.options.timing_only {
                report::timing_row(&detection)
            } else {
                report::image_stats_row(&detection)
            })?;
            if self.options.keypoints_csv {
                report::write_keypoints(output(&format!("{}_keypoints.csv", name)), &keypoints)?;
            }
            if self.options.annotate {
                render::save_annotated(&output(&format!("{}.jpg", name)), &image, &keypoints)?;
            }
            detections.push(detection);
        }
        stats.finish()?;
        Ok(detections)
    }

    /// Process `input` as a single image, or every `.jpg` and `.png` directly
    /// inside it when it is a directory. Stops at the first failure.
    pub fn process_path(&mut self, input: &Path, output_dir: &Path) -> Result<Vec<Detection>> {
        if !input.is_dir() {
            return self.process_image(input, output_dir);
        }
        let mut detections = vec![];
        for path in sorted_entries(input)? {
            let extension = path.extension();
            if path.is_file()
                && (extension == Some(OsStr::new("jpg")) || extension == Some(OsStr::new("png")))
            {
                detections.extend(self.process_image(&path, output_dir)?);
            }
        }
        Ok(detections)
    }

    /// Directory mode: write a `stats.csv` for `dir` (and, with `recurse`,
    /// for each directory below it) into the mirrored directory under
    /// `output_dir`. Each `stats.csv` ends with one `<dir>/**` row per
    /// detector aggregating everything below that directory.
    ///
    /// Images that cannot be loaded are skipped with a warning.
    pub fn process_tree(
        &mut self,
        dir: &Path,
        output_dir: &Path,
        recurse: bool,
    ) -> Result<Vec<DetectionList>> {
        if !dir.is_dir() {
            return Err(Error::InputNotDirectory(dir.to_owned()));
        }
        fs::create_dir_all(output_dir).map_err(Error::io(output_dir))?;
        let mut counts = if self.options.feature_counts {
            Some(CsvFile::create(
                output_dir.join("features_by_detector.csv"),
                &report::counts_header(&self.detector_names()),
            )?)
        } else {
            None
        };
        let skip = fs::canonicalize(output_dir).ok();
        let lists = self.visit(dir, output_dir, recurse, skip.as_deref(), &mut counts)?;
        if let Some(counts) = counts {
            counts.finish()?;
        }
        Ok(lists)
    }

    fn visit(
        &mut self,
        dir: &Path,
        output_dir: &Path,
        recurse: bool,
        skip: Option<&Path>,
        counts: &mut Option<CsvFile>,
    ) -> Result<Vec<DetectionList>> {
        fs::create_dir_all(output_dir).map_err(Error::io(output_dir))?;
        let mut stats = CsvFile::create(output_dir.join("stats.csv"), report::DIRECTORY_STATS_HEADER)?;
        let mut lists: Vec<DetectionList> = self
            .detectors
            .iter()
            .map(|d| DetectionList::new(dir, d.name()))
            .collect();

        for path in sorted_entries(dir)? {
            if path.is_file() && is_jpeg(&path) {
                let detections = match self.process_image(&path, output_dir) {
                    Ok(detections) => detections,
                    Err(e @ Error::ImageLoad { .. }) => {
                        warn!("{}", e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                for (list, detection) in lists.iter_mut().zip(&detections) {
                    stats.write_row(&report::detection_row(detection))?;
                    list.add(detection);
                }
                if let Some(counts) = counts {
                    let row: Vec<usize> = detections.iter().map(Detection::keypoints).collect();
                    counts.write_row(&report::counts_row(&path, &row))?;
                }
            } else if path.is_dir() && recurse {
                if skip.is_some() && fs::canonicalize(&path).ok().as_deref() == skip {
                    debug!("not descending into output directory {}", path.display());
                    continue;
                }
                let child_output = match path.file_name() {
                    Some(name) => output_dir.join(name),
                    None => continue,
                };
                let children = self.visit(&path, &child_output, recurse, skip, counts)?;
                for (list, child) in lists.iter_mut().zip(&children) {
                    list.add_list(child);
                }
            }
        }

        for list in &lists {
            stats.write_row(&report::directory_row(list))?;
        }
        stats.finish()?;
        Ok(lists)
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map_or(false, |extension| extension.eq_ignore_ascii_case("jpg"))
}

/// Directory entries sorted by path so runs are reproducible.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .map_err(Error::io(dir))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(Error::io(dir))?;
    paths.sort();
    Ok(paths)
}
