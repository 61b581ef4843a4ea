//! Binary thresholding of normalized heatmaps.

use crate::Heatmap;

/// Foreground value written into a [`BinaryMask`].
pub const MASK_ON: u8 = 255;

/// 8-bit binary mask, values are either `0` or [`MASK_ON`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl BinaryMask {
    #[inline]
    pub fn is_set(&self, row: usize, col: usize) -> bool {
        self.data[row * self.width + col] != 0
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }
}

/// Scale a `[0, 1]` map to `[0, 255]` and keep pixels strictly above `threshold`.
pub fn binarize(map: &Heatmap, threshold: u8) -> BinaryMask {
    let t = threshold as f32;
    BinaryMask {
        width: map.width,
        height: map.height,
        data: map
            .data
            .iter()
            .map(|&v| if v * 255.0 > t { MASK_ON } else { 0 })
            .collect(),
    }
}
