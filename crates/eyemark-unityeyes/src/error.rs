use eyemark_core::DecodeError;
use std::path::PathBuf;

/// Errors returned while loading a UnityEyes sample.
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Heatmap(#[from] DecodeError),

    #[error("no samples found in {0}")]
    Empty(PathBuf),

    #[error("sample index {index} out of range (dataset has {len} samples)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("malformed landmark `{0}`")]
    Landmark(String),

    #[error("`{field}` has {got} landmarks, need at least {expected}")]
    TooFewLandmarks {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("eye region is degenerate (width={width:.2} px)")]
    DegenerateEye { width: f32 },
}
