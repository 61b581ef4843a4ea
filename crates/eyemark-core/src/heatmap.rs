use crate::DecodeError;

/// Row-major single-channel `f32` map.
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>, // row-major, len = w*h
}

impl Heatmap {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Wrap a row-major buffer, checking its length against the dimensions.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidSize { width, height });
        }
        let Some(expected) = width.checked_mul(height) else {
            return Err(DecodeError::InvalidSize { width, height });
        };
        if data.len() != expected {
            return Err(DecodeError::BufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a map by evaluating `f(row, col)` at every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for r in 0..height {
            for c in 0..width {
                data.push(f(r, c));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Convert an 8-bit grayscale image into a map with values in [0, 1].
    pub fn from_luma8(img: &image::GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img.as_raw().iter().map(|&v| v as f32 / 255.0).collect(),
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, v: f32) {
        self.data[row * self.width + col] = v;
    }

    #[inline]
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Minimum and maximum value, ignoring NaNs. `None` for an all-NaN map.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut it = self.data.iter().copied().filter(|v| !v.is_nan());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Position `(row, col)` of the maximum value (first occurrence).
    pub fn argmax(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &v) in self.data.iter().enumerate() {
            if v.is_nan() {
                continue;
            }
            if best.is_none_or(|(_, b)| v > b) {
                best = Some((i, v));
            }
        }
        best.map(|(i, _)| (i / self.width, i % self.width))
    }

    /// Linearly rescale to an 8-bit image (min -> 0, max -> 255).
    ///
    /// Constant maps become all-black.
    pub fn to_luma8(&self) -> image::GrayImage {
        let (lo, hi) = self.min_max().unwrap_or((0.0, 0.0));
        let range = hi - lo;
        let scale = if range > 0.0 && range.is_finite() {
            255.0 / range
        } else {
            0.0
        };
        let pixels = self
            .data
            .iter()
            .map(|&v| ((v - lo) * scale).round().clamp(0.0, 255.0) as u8)
            .collect();
        image::GrayImage::from_raw(self.width as u32, self.height as u32, pixels)
            .unwrap_or_else(|| image::GrayImage::new(self.width as u32, self.height as u32))
    }
}

#[inline]
fn get_clamped(src: &Heatmap, x: i64, y: i64) -> f32 {
    let xc = x.clamp(0, src.width as i64 - 1) as usize;
    let yc = y.clamp(0, src.height as i64 - 1) as usize;
    src.data[yc * src.width + xc]
}

/// Bilinear sample at continuous pixel coordinates, replicating border pixels.
#[inline]
pub fn sample_bilinear(src: &Heatmap, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_clamped(src, x0, y0);
    let p10 = get_clamped(src, x0 + 1, y0);
    let p01 = get_clamped(src, x0, y0 + 1);
    let p11 = get_clamped(src, x0 + 1, y0 + 1);

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

/// Resize with bilinear interpolation using half-pixel centers.
///
/// Source coordinates below zero are clamped to the first pixel, so an
/// identity-sized resize returns the input unchanged.
pub fn resize_bilinear(
    src: &Heatmap,
    width: usize,
    height: usize,
) -> Result<Heatmap, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidSize { width, height });
    }
    if src.width == 0 || src.height == 0 {
        return Err(DecodeError::InvalidSize {
            width: src.width,
            height: src.height,
        });
    }
    if src.size() == (width, height) {
        return Ok(src.clone());
    }

    let sx = src.width as f32 / width as f32;
    let sy = src.height as f32 / height as f32;
    Ok(Heatmap::from_fn(width, height, |r, c| {
        let x = ((c as f32 + 0.5) * sx - 0.5).max(0.0);
        let y = ((r as f32 + 0.5) * sy - 0.5).max(0.0);
        sample_bilinear(src, x, y)
    }))
}

fn reduce_maps<'a>(
    maps: impl IntoIterator<Item = &'a Heatmap>,
) -> Result<(Heatmap, usize), DecodeError> {
    let mut iter = maps.into_iter();
    let Some(first) = iter.next() else {
        return Err(DecodeError::EmptyStack);
    };
    let mut acc = first.clone();
    let mut count = 1;
    for m in iter {
        if m.size() != acc.size() {
            return Err(DecodeError::MismatchedSize {
                expected: acc.size(),
                got: m.size(),
            });
        }
        for (a, v) in acc.data.iter_mut().zip(&m.data) {
            *a += v;
        }
        count += 1;
    }
    Ok((acc, count))
}

/// Element-wise sum of equally sized maps.
pub fn sum_maps<'a>(maps: impl IntoIterator<Item = &'a Heatmap>) -> Result<Heatmap, DecodeError> {
    reduce_maps(maps).map(|(sum, _)| sum)
}

/// Element-wise mean of equally sized maps.
pub fn mean_maps<'a>(maps: impl IntoIterator<Item = &'a Heatmap>) -> Result<Heatmap, DecodeError> {
    let (mut sum, count) = reduce_maps(maps)?;
    let inv = 1.0 / count as f32;
    sum.data.iter_mut().for_each(|v| *v *= inv);
    Ok(sum)
}

/// Ordered per-landmark heatmaps sharing one resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapStack {
    channels: Vec<Heatmap>,
}

impl HeatmapStack {
    pub fn new(channels: Vec<Heatmap>) -> Result<Self, DecodeError> {
        let Some(first) = channels.first() else {
            return Err(DecodeError::EmptyStack);
        };
        let size = first.size();
        if let Some(bad) = channels.iter().find(|m| m.size() != size) {
            return Err(DecodeError::MismatchedSize {
                expected: size,
                got: bad.size(),
            });
        }
        Ok(Self { channels })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// `(width, height)` shared by all channels.
    pub fn size(&self) -> (usize, usize) {
        self.channels[0].size()
    }

    pub fn channels(&self) -> &[Heatmap] {
        &self.channels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Heatmap> {
        self.channels.iter()
    }

    pub fn sum(&self) -> Heatmap {
        // Sizes are validated at construction.
        sum_maps(&self.channels).unwrap_or_else(|_| Heatmap::zeros(0, 0))
    }
}

impl<'a> IntoIterator for &'a HeatmapStack {
    type Item = &'a Heatmap;
    type IntoIter = std::slice::Iter<'a, Heatmap>;

    fn into_iter(self) -> Self::IntoIter {
        self.channels.iter()
    }
}
