//! A harness that runs keypoint detectors over photographs, times them and
//! writes response statistics to CSV.
//!
//! [`FeaturePipeline`] drives the detectors selected by name from
//! `kelp-features`. Single images and flat directories produce a
//! `<stem>_stats.csv` per image, while [`FeaturePipeline::process_tree`]
//! also aggregates the statistics of whole directory trees into `stats.csv`
//! files.

mod error;
pub mod grayscale;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod stats;

pub use error::{Error, Result};
pub use pipeline::{FeaturePipeline, PipelineOptions};
pub use stats::{Detection, DetectionList, Responses};
