use kelpbench::{Error, FeaturePipeline, PipelineOptions};
use kelp_features::SelectionConfig;
use log::*;
use std::path::PathBuf;
use structopt::StructOpt;

/// The detector types suggested when an unknown one is given.
const POSSIBLE_DETECTORS: &str = "SIFT, BRISK, ORB, MSER, AKAZE, FAST, blob, Agast, GFTT, desc, all";

#[derive(Debug, StructOpt)]
#[structopt(
    name = "kelpbench",
    about = "Times keypoint detectors on images and writes their statistics to CSV"
)]
struct Opt {
    /// Draw the keypoints of each detector onto a copy of the image.
    #[structopt(short, long)]
    annotate: bool,
    /// Write every keypoint of each detector to a CSV file.
    #[structopt(short, long)]
    keypoints: bool,
    /// Also compute descriptors, so the timing includes them.
    #[structopt(short, long)]
    compute: bool,
    /// Only write keypoint counts and timings to the per-image statistics.
    #[structopt(short, long)]
    timing_only: bool,
    /// Treat the input as a directory tree and write a stats.csv for every
    /// directory in it, aggregating the directories below.
    #[structopt(short, long)]
    recurse: bool,
    /// With --recurse, also write features_by_detector.csv with the keypoint
    /// count of every image.
    #[structopt(long)]
    counts: bool,
    /// Maximum number of ORB features.
    #[structopt(long, default_value = "500")]
    orb_features: usize,
    /// The AKAZE detector threshold.
    ///
    /// 0.01 will be very sparse and 0.0001 will be very dense.
    #[structopt(long, default_value = "0.001")]
    akaze_threshold: f64,
    /// The detectors to run: SIFT, BRISK, ORB, AKAZE, MSER, FAST, blob,
    /// Agast, GFTT, desc (the four with descriptors) or all.
    detector_type: String,
    /// An image, or a directory of images.
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    /// An existing directory the results are written to.
    #[structopt(parse(from_os_str))]
    output: PathBuf,
}

fn run(opt: &Opt) -> kelpbench::Result<()> {
    if !opt.output.is_dir() {
        return Err(Error::OutputNotDirectory(opt.output.clone()));
    }
    let config = SelectionConfig {
        orb_features: opt.orb_features,
        akaze_threshold: opt.akaze_threshold,
    };
    let options = PipelineOptions {
        annotate: opt.annotate,
        keypoints_csv: opt.keypoints,
        compute_descriptors: opt.compute,
        timing_only: opt.timing_only,
        feature_counts: opt.counts,
    };
    let mut pipeline = FeaturePipeline::from_detector_type(&opt.detector_type, &config, options)?;
    info!("running {}", pipeline.detector_names().join(", "));

    if opt.recurse {
        pipeline.process_tree(&opt.input, &opt.output, true)?;
    } else {
        let detections = pipeline.process_path(&opt.input, &opt.output)?;
        info!("finished {} detections", detections.len());
    }
    Ok(())
}

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();

    if let Err(e) = run(&opt) {
        match &e {
            Error::OutputNotDirectory(_) => println!("{}", e),
            Error::Detector(kelp_features::Error::UnknownDetector(name)) => {
                println!("Unknown detector type: {}", name);
                println!("Possible detectors: {}", POSSIBLE_DETECTORS);
            }
            _ => {
                error!("{}", e);
                let mut source = std::error::Error::source(&e);
                while let Some(cause) = source {
                    error!("caused by: {}", cause);
                    source = cause.source();
                }
            }
        }
        std::process::exit(1);
    }
}
