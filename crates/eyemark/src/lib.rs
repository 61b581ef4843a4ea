//! Facade crate for the `eyemark-*` workspace.
//!
//! This crate provides:
//! - re-exports of the heatmap, model and dataset crates
//! - [`eval::run`], which loads one UnityEyes sample, runs a stacked heatmap
//!   network on it, decodes the last stack and writes a four-panel figure
//!
//! ## Quickstart
//!
//! ```no_run
//! use eyemark::io::EvalConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = EvalConfig {
//!     dataset_dir: "datasets/UnityEyes".into(),
//!     report_path: Some("report.json".into()),
//!     ..EvalConfig::default()
//! };
//! let report = eyemark::eval::run(&cfg)?;
//! println!("{} landmarks from {}", report.channels, report.model_source);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `eyemark::core`: heatmaps, normalization, thresholding, moments, decoding.
//! - `eyemark::posenet`: model configuration, checkpoints and the network.
//! - `eyemark::unityeyes`: dataset indexing and sample preprocessing.
//! - `eyemark::eval`: single-sample evaluation.
//! - `eyemark::io`: JSON config and report.
//! - `eyemark::visualize`: figure composition.

pub use eyemark_core as core;
pub use eyemark_posenet as posenet;
pub use eyemark_unityeyes as unityeyes;

pub use eyemark_core::{DecodeParams, DecodedLandmark, HeatmapDecoder};
pub use eyemark_posenet::{PoseModel, PoseNetConfig, PriorHeadNet};
pub use eyemark_unityeyes::{PreprocessParams, Sample, UnityEyesDataset};

pub mod eval;
pub mod io;
pub mod visualize;

pub use eval::{EvalError, Evaluation};
pub use io::{EvalConfig, EvaluationReport, LandmarkReport};
