//! Raw image moments and centroids.

use crate::BinaryMask;
use serde::{Deserialize, Serialize};

/// Integer pixel position of a landmark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Centroid {
    pub row: usize,
    pub col: usize,
}

impl Centroid {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Zeroth and first order raw moments.
///
/// `m10` accumulates along columns (x), `m01` along rows (y).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Moments of an 8-bit mask, weighting each pixel by its stored value.
    pub fn of_mask(mask: &BinaryMask) -> Self {
        let mut m = Moments::default();
        for (r, row) in mask.data.chunks_exact(mask.width).enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v == 0 {
                    continue;
                }
                let w = v as f64;
                m.m00 += w;
                m.m10 += w * c as f64;
                m.m01 += w * r as f64;
            }
        }
        m
    }

    /// Sub-pixel center `(row, col)`, `None` when the mass is zero.
    pub fn center(&self) -> Option<(f64, f64)> {
        if self.m00 <= 0.0 {
            return None;
        }
        Some((self.m01 / self.m00, self.m10 / self.m00))
    }

    /// Center truncated to integer pixel coordinates.
    pub fn centroid(&self) -> Option<Centroid> {
        let (r, c) = self.center()?;
        Some(Centroid::new(r.trunc() as usize, c.trunc() as usize))
    }
}
