//! UnityEyes per-image JSON annotations.
//!
//! Landmarks are stored as `"(x, y, z)"` strings in image pixels with the
//! origin at the bottom-left corner.

use crate::DatasetError;
use nalgebra::Point2;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Clone, Debug, Deserialize)]
pub struct RawAnnotation {
    pub interior_margin_2d: Vec<String>,
    #[serde(default)]
    pub caruncle_2d: Vec<String>,
    pub iris_2d: Vec<String>,
}

/// Landmarks in top-left-origin image pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct EyeAnnotation {
    pub interior_margin: Vec<Point2<f32>>,
    pub caruncle: Vec<Point2<f32>>,
    pub iris: Vec<Point2<f32>>,
}

/// Parse one `"(x, y, z)"` entry into `(x, y)`.
pub(crate) fn parse_point(raw: &str) -> Result<Point2<f32>, DatasetError> {
    let inner = raw
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| DatasetError::Landmark(raw.to_string()))?;
    let mut coords = inner.split(',').map(|v| v.trim().parse::<f32>());
    match (coords.next(), coords.next()) {
        (Some(Ok(x)), Some(Ok(y))) => Ok(Point2::new(x, y)),
        _ => Err(DatasetError::Landmark(raw.to_string())),
    }
}

fn parse_list(raw: &[String], image_height: u32) -> Result<Vec<Point2<f32>>, DatasetError> {
    let h = image_height as f32;
    raw.iter()
        .map(|s| parse_point(s).map(|p| Point2::new(p.x, h - p.y)))
        .collect()
}

impl EyeAnnotation {
    /// Convert raw annotations, flipping `y` for an image of `image_height` rows.
    pub fn from_raw(raw: &RawAnnotation, image_height: u32) -> Result<Self, DatasetError> {
        Ok(Self {
            interior_margin: parse_list(&raw.interior_margin_2d, image_height)?,
            caruncle: parse_list(&raw.caruncle_2d, image_height)?,
            iris: parse_list(&raw.iris_2d, image_height)?,
        })
    }

    pub fn load_json(path: impl AsRef<Path>, image_height: u32) -> Result<Self, DatasetError> {
        let raw: RawAnnotation = serde_json::from_str(&fs::read_to_string(path)?)?;
        Self::from_raw(&raw, image_height)
    }
}
