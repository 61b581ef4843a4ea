//! Heatmap types and landmark decoding.
//!
//! This crate is intentionally small and purely numerical. It does *not*
//! know about any concrete network, dataset format or plotting backend.

mod decode;
mod error;
mod gaussian;
mod heatmap;
mod moments;
mod normalize;
mod threshold;

pub use decode::{DecodeParams, DecodedLandmark, HeatmapDecoder};
pub use error::DecodeError;
pub use gaussian::{render_gaussian, render_gaussian_at};
pub use heatmap::{mean_maps, resize_bilinear, sample_bilinear, sum_maps, Heatmap, HeatmapStack};
pub use moments::{Centroid, Moments};
pub use normalize::{normalize_all, normalize_min_max};
pub use threshold::{binarize, BinaryMask, MASK_ON};
