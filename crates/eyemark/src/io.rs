//! JSON configuration and report helpers for evaluation runs.

use eyemark_core::DecodeParams;
use eyemark_posenet::{PoseNetConfig, DEFAULT_CHECKPOINT_PATH};
use eyemark_unityeyes::PreprocessParams;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum EvalIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Directory of UnityEyes `<n>.jpg` + `<n>.json` pairs.
    pub dataset_dir: String,
    /// Position of the evaluated sample in the sorted dataset.
    pub sample_index: usize,
    /// Optional checkpoint; a missing file means random initialization.
    pub checkpoint_path: String,
    /// Seed of the random initialization used without a checkpoint.
    pub seed: u64,
    pub model: PoseNetConfig,
    pub preprocess: PreprocessParams,
    pub decode: DecodeParams,
    /// Where the four-panel figure is written.
    pub output_path: Option<String>,
    /// Where the JSON report is written, if anywhere.
    pub report_path: Option<String>,
    /// Height of each figure panel in pixels.
    pub panel_height: u32,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            dataset_dir: "datasets/UnityEyes".to_string(),
            sample_index: 0,
            checkpoint_path: DEFAULT_CHECKPOINT_PATH.to_string(),
            seed: 0,
            model: PoseNetConfig::default(),
            preprocess: PreprocessParams::default(),
            decode: DecodeParams::default(),
            output_path: None,
            report_path: None,
            panel_height: 180,
        }
    }
}

impl EvalConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, EvalIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), EvalIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the figure path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("posenet_eval.png"))
    }
}

/// Decoded landmark of one channel, with its ground truth when available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkReport {
    pub channel: usize,
    /// Predicted centroid `[row, col]` in output pixels.
    pub predicted: [usize; 2],
    /// Ground-truth landmark `[row, col]` scaled to output pixels.
    #[serde(default)]
    pub ground_truth: Option<[f32; 2]>,
    /// Euclidean distance between prediction and ground truth.
    #[serde(default)]
    pub error_px: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub dataset_dir: String,
    pub sample_index: usize,
    /// `checkpoint` or `random_init`.
    pub model_source: String,
    #[serde(default)]
    pub checkpoint_path: Option<String>,
    pub nstack: usize,
    pub channels: usize,
    /// `[width, height]` of the raw network heatmaps.
    pub heatmap_size: [usize; 2],
    /// `[width, height]` of the decoded maps.
    pub output_size: [usize; 2],
    pub landmarks: Vec<LandmarkReport>,
    #[serde(default)]
    pub mean_error_px: Option<f32>,
    #[serde(default)]
    pub figure_path: Option<String>,
}

impl EvaluationReport {
    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, EvalIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), EvalIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
