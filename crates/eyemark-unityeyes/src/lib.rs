//! UnityEyes dataset loading.
//!
//! A sample is built from a rendered eye image and its JSON annotation:
//! - the full color image is kept for display,
//! - a grayscale crop around the eyelid margin becomes the network input,
//! - eyelid and iris landmarks are resampled and rendered as Gaussian
//!   ground-truth heatmaps at half the crop resolution.

mod annotation;
mod dataset;
mod error;
mod preprocess;

pub use annotation::{EyeAnnotation, RawAnnotation};
pub use dataset::{preprocess, Sample, UnityEyesDataset};
pub use error::DatasetError;
pub use preprocess::{
    equalize_hist, extract_crop, landmark_heatmaps, resample_evenly, CropWindow, PreprocessParams,
};
