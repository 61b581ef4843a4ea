use crate::preprocess::{equalize_hist, extract_crop, landmark_heatmaps, resample_evenly, CropWindow};
use crate::{DatasetError, EyeAnnotation, PreprocessParams};
use eyemark_core::{Heatmap, HeatmapStack};
use image::ImageReader;
use nalgebra::Point2;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One preprocessed UnityEyes record.
#[derive(Clone, Debug)]
pub struct Sample {
    /// Source image as rendered by UnityEyes.
    pub full_img: image::RgbImage,
    /// Grayscale eye crop normalized to `[0, 1]`.
    pub img: Heatmap,
    /// Ground-truth heatmaps, eyelid landmarks first, then iris.
    pub heatmaps: HeatmapStack,
    /// Landmarks in `img` pixel coordinates, same order as `heatmaps`.
    pub landmarks: Vec<Point2<f32>>,
}

/// A directory of `<n>.jpg` + `<n>.json` pairs, ordered by `n`.
#[derive(Clone, Debug)]
pub struct UnityEyesDataset {
    root: PathBuf,
    stems: Vec<String>,
    params: PreprocessParams,
}

fn sort_key(stem: &str) -> (u64, String) {
    (stem.parse().unwrap_or(u64::MAX), stem.to_string())
}

impl UnityEyesDataset {
    /// Index every annotated image under `root`.
    pub fn open(root: impl AsRef<Path>, params: PreprocessParams) -> Result<Self, DatasetError> {
        let root = root.as_ref().to_path_buf();
        let mut stems = Vec::new();
        for entry in fs::read_dir(&root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if root.join(format!("{stem}.jpg")).is_file() {
                stems.push(stem.to_string());
            } else {
                log::warn!("skipping {}: no matching .jpg", path.display());
            }
        }
        if stems.is_empty() {
            return Err(DatasetError::Empty(root));
        }
        stems.sort_by_key(|s| sort_key(s));
        log::debug!("indexed {} UnityEyes samples in {}", stems.len(), root.display());
        Ok(Self {
            root,
            stems,
            params,
        })
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    /// Load and preprocess the sample at position `index`.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn get(&self, index: usize) -> Result<Sample, DatasetError> {
        let stem = self
            .stems
            .get(index)
            .ok_or(DatasetError::IndexOutOfRange {
                index,
                len: self.stems.len(),
            })?;
        let image_path = self.root.join(format!("{stem}.jpg"));
        let json_path = self.root.join(format!("{stem}.json"));

        let full = ImageReader::open(&image_path)?.decode()?;
        let ann = EyeAnnotation::load_json(&json_path, full.height())?;
        let sample = preprocess(full.to_rgb8(), &ann, &self.params)?;
        log::debug!(
            "loaded sample {} ({}x{}) with {} landmarks",
            image_path.display(),
            sample.full_img.width(),
            sample.full_img.height(),
            sample.landmarks.len()
        );
        Ok(sample)
    }
}

/// Build a [`Sample`] from a decoded image and its annotation.
pub fn preprocess(
    full_img: image::RgbImage,
    ann: &EyeAnnotation,
    params: &PreprocessParams,
) -> Result<Sample, DatasetError> {
    let window = CropWindow::around_eye(ann, params)?;

    let gray = image::imageops::grayscale(&full_img);
    let mut crop = extract_crop(&gray, &window, params);
    if params.equalize {
        crop = equalize_hist(&crop);
    }

    let eyelid = resample_evenly(
        &ann.interior_margin,
        params.eyelid_points,
        "interior_margin_2d",
    )?;
    let iris = resample_evenly(&ann.iris, params.iris_points, "iris_2d")?;
    let landmarks: Vec<Point2<f32>> = eyelid
        .into_iter()
        .chain(iris)
        .map(|p| window.to_crop(p))
        .collect();

    Ok(Sample {
        full_img,
        img: Heatmap::from_luma8(&crop),
        heatmaps: landmark_heatmaps(&landmarks, params)?,
        landmarks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_stems_sort_numerically() {
        let mut stems = vec!["10", "2", "1", "abc"];
        stems.sort_by_key(|s| sort_key(s));
        assert_eq!(stems, vec!["1", "2", "10", "abc"]);
    }
}
