//! Eye crop extraction and ground-truth heatmap synthesis.

use crate::{DatasetError, EyeAnnotation};
use eyemark_core::{render_gaussian_at, sample_bilinear, Heatmap, HeatmapStack};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Preprocessing configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParams {
    /// Eye crop width in pixels.
    pub eye_width: usize,
    /// Eye crop height in pixels.
    pub eye_height: usize,
    /// Ground-truth heatmap width in pixels.
    pub heatmap_width: usize,
    /// Ground-truth heatmap height in pixels.
    pub heatmap_height: usize,
    /// Sigma of ground-truth Gaussians in heatmap pixels.
    pub heatmap_sigma: f32,
    /// Crop width as a multiple of the eye corner-to-corner width.
    pub crop_margin: f32,
    /// Landmarks resampled from the eyelid margin.
    pub eyelid_points: usize,
    /// Landmarks resampled from the iris contour.
    pub iris_points: usize,
    /// Apply histogram equalization to the crop.
    pub equalize: bool,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            eye_width: 160,
            eye_height: 96,
            heatmap_width: 80,
            heatmap_height: 48,
            heatmap_sigma: 2.0,
            crop_margin: 1.5,
            eyelid_points: 16,
            iris_points: 16,
            equalize: true,
        }
    }
}

impl PreprocessParams {
    /// Number of landmark channels produced per sample.
    pub fn channels(&self) -> usize {
        self.eyelid_points + self.iris_points
    }
}

/// Axis-aligned crop: `crop = (image - origin) * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropWindow {
    pub origin: Point2<f32>,
    pub scale: f32,
}

impl CropWindow {
    /// Window centered on the eyelid margin, sized from the eye corners.
    pub fn around_eye(
        ann: &EyeAnnotation,
        params: &PreprocessParams,
    ) -> Result<Self, DatasetError> {
        let corners = ann.interior_margin.iter().chain(&ann.caruncle);
        let (min_x, max_x) = corners.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.x), hi.max(p.x))
        });
        let width = max_x - min_x;
        if !(width > 1.0 && width.is_finite()) {
            return Err(DatasetError::DegenerateEye { width });
        }

        let n = ann.interior_margin.len() as f32;
        let cx = ann.interior_margin.iter().map(|p| p.x).sum::<f32>() / n;
        let cy = ann.interior_margin.iter().map(|p| p.y).sum::<f32>() / n;

        let crop_w = width * params.crop_margin;
        let crop_h = crop_w * params.eye_height as f32 / params.eye_width as f32;
        Ok(Self {
            origin: Point2::new(cx - 0.5 * crop_w, cy - 0.5 * crop_h),
            scale: params.eye_width as f32 / crop_w,
        })
    }

    #[inline]
    pub fn to_crop(&self, p: Point2<f32>) -> Point2<f32> {
        Point2::new(
            (p.x - self.origin.x) * self.scale,
            (p.y - self.origin.y) * self.scale,
        )
    }

    #[inline]
    pub fn to_image(&self, p: Point2<f32>) -> Point2<f32> {
        Point2::new(
            p.x / self.scale + self.origin.x,
            p.y / self.scale + self.origin.y,
        )
    }
}

/// Pick `count` points spread evenly along `points`.
pub fn resample_evenly(
    points: &[Point2<f32>],
    count: usize,
    field: &'static str,
) -> Result<Vec<Point2<f32>>, DatasetError> {
    if points.len() < count {
        return Err(DatasetError::TooFewLandmarks {
            field,
            expected: count,
            got: points.len(),
        });
    }
    Ok((0..count)
        .map(|i| points[i * points.len() / count])
        .collect())
}

/// Histogram equalization of an 8-bit image.
pub fn equalize_hist(img: &image::GrayImage) -> image::GrayImage {
    let mut hist = [0u32; 256];
    for &v in img.as_raw() {
        hist[v as usize] += 1;
    }
    let total: u32 = hist.iter().sum();
    let Some(first) = hist.iter().position(|&h| h > 0) else {
        return img.clone();
    };
    if hist[first] == total {
        return img.clone();
    }

    let scale = 255.0 / (total - hist[first]) as f32;
    let mut lut = [0u8; 256];
    let mut cum = hist[first];
    for v in first + 1..256 {
        cum += hist[v];
        lut[v] = ((cum - hist[first]) as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }

    let mut out = img.clone();
    for p in out.pixels_mut() {
        p.0[0] = lut[p.0[0] as usize];
    }
    out
}

/// Sample the crop out of a full grayscale image.
pub fn extract_crop(
    gray: &image::GrayImage,
    window: &CropWindow,
    params: &PreprocessParams,
) -> image::GrayImage {
    let src = Heatmap::from_luma8(gray);
    image::GrayImage::from_fn(params.eye_width as u32, params.eye_height as u32, |x, y| {
        let p = window.to_image(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
        let v = sample_bilinear(&src, p.x - 0.5, p.y - 0.5);
        image::Luma([(v * 255.0).round().clamp(0.0, 255.0) as u8])
    })
}

/// One Gaussian heatmap per landmark, at heatmap resolution.
///
/// `landmarks` are in eye-crop pixel coordinates.
pub fn landmark_heatmaps(
    landmarks: &[Point2<f32>],
    params: &PreprocessParams,
) -> Result<HeatmapStack, DatasetError> {
    let sx = params.heatmap_width as f32 / params.eye_width as f32;
    let sy = params.heatmap_height as f32 / params.eye_height as f32;
    let maps = landmarks
        .iter()
        .map(|p| {
            render_gaussian_at(
                params.heatmap_width,
                params.heatmap_height,
                p.y * sy,
                p.x * sx,
                params.heatmap_sigma,
            )
        })
        .collect();
    Ok(HeatmapStack::new(maps)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn eye(cx: f32, cy: f32, half_width: f32) -> EyeAnnotation {
        let ring = |n: usize, rx: f32, ry: f32| -> Vec<Point2<f32>> {
            (0..n)
                .map(|i| {
                    let t = i as f32 / n as f32 * std::f32::consts::TAU;
                    Point2::new(cx + rx * t.cos(), cy + ry * t.sin())
                })
                .collect()
        };
        EyeAnnotation {
            interior_margin: ring(16, half_width, half_width * 0.4),
            caruncle: vec![],
            iris: ring(32, half_width * 0.3, half_width * 0.3),
        }
    }

    #[test]
    fn crop_window_centers_the_eye() {
        let params = PreprocessParams::default();
        let ann = eye(320.0, 240.0, 50.0);
        let win = CropWindow::around_eye(&ann, &params).unwrap();
        let c = win.to_crop(Point2::new(320.0, 240.0));
        assert_abs_diff_eq!(c.x, 80.0, epsilon = 1e-3);
        assert_abs_diff_eq!(c.y, 48.0, epsilon = 1e-3);
        // 100 px eye * 1.5 margin -> 150 px crop mapped onto 160 px.
        assert_abs_diff_eq!(win.scale, 160.0 / 150.0, epsilon = 1e-5);

        let back = win.to_image(c);
        assert_abs_diff_eq!(back.x, 320.0, epsilon = 1e-3);
        assert_abs_diff_eq!(back.y, 240.0, epsilon = 1e-3);
    }

    #[test]
    fn degenerate_eye_is_rejected() {
        let params = PreprocessParams::default();
        let mut ann = eye(10.0, 10.0, 5.0);
        ann.interior_margin = vec![Point2::new(10.0, 10.0); 16];
        assert!(matches!(
            CropWindow::around_eye(&ann, &params),
            Err(DatasetError::DegenerateEye { .. })
        ));
    }

    #[test]
    fn resampling_spreads_indices() {
        let pts: Vec<_> = (0..32).map(|i| Point2::new(i as f32, 0.0)).collect();
        let out = resample_evenly(&pts, 16, "iris_2d").unwrap();
        assert_eq!(out.len(), 16);
        assert_eq!(out[1].x, 2.0);
        assert_eq!(out[15].x, 30.0);
        assert!(matches!(
            resample_evenly(&pts[..8], 16, "iris_2d"),
            Err(DatasetError::TooFewLandmarks {
                field: "iris_2d",
                expected: 16,
                got: 8
            })
        ));
    }

    #[test]
    fn equalization_stretches_range() {
        let img = image::GrayImage::from_fn(4, 1, |x, _| image::Luma([100 + x as u8]));
        let eq = equalize_hist(&img);
        assert_eq!(eq.as_raw(), &vec![0, 85, 170, 255]);

        let flat = image::GrayImage::from_pixel(3, 3, image::Luma([42]));
        assert_eq!(equalize_hist(&flat), flat);
    }

    #[test]
    fn heatmaps_peak_at_scaled_landmarks() {
        let params = PreprocessParams::default();
        let lms = [Point2::new(40.0, 20.0), Point2::new(120.0, 70.0)];
        let stack = landmark_heatmaps(&lms, &params).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.size(), (80, 48));
        assert_eq!(stack.channels()[0].argmax(), Some((10, 20)));
        assert_eq!(stack.channels()[1].argmax(), Some((35, 60)));
    }

    #[test]
    fn crop_copies_image_content() {
        let params = PreprocessParams {
            eye_width: 20,
            eye_height: 10,
            ..PreprocessParams::default()
        };
        let gray =
            image::GrayImage::from_fn(40, 20, |x, _| image::Luma([if x < 20 { 0 } else { 200 }]));
        // Identity window over the left-hand half.
        let win = CropWindow {
            origin: Point2::new(0.0, 0.0),
            scale: 1.0,
        };
        let crop = extract_crop(&gray, &win, &params);
        assert_eq!(crop.dimensions(), (20, 10));
        assert!(crop.as_raw().iter().all(|&v| v == 0));

        let win = CropWindow {
            origin: Point2::new(20.0, 5.0),
            scale: 1.0,
        };
        let crop = extract_crop(&gray, &win, &params);
        assert!(crop.as_raw().iter().all(|&v| v == 200));
    }
}
