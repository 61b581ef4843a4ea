//! Heatmap-to-landmark decoding.
//!
//! Per channel: resize to the output resolution, normalize to `[0, 1]`,
//! threshold into a binary mask, take the centroid from image moments and
//! re-render a fixed-sigma Gaussian at that centroid.

use crate::{
    binarize, normalize_min_max, render_gaussian, resize_bilinear, Centroid, DecodeError, Heatmap,
    HeatmapStack, Moments,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Configuration for [`HeatmapDecoder`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeParams {
    /// Output map width in pixels.
    pub output_width: usize,
    /// Output map height in pixels.
    pub output_height: usize,
    /// Threshold on the `[0, 255]` scale; pixels strictly above it are foreground.
    pub threshold: u8,
    /// Sigma of the re-rendered Gaussian, in output pixels.
    pub sigma: f32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            output_width: 150,
            output_height: 90,
            threshold: 127,
            sigma: 3.0,
        }
    }
}

/// One decoded channel.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedLandmark {
    pub channel: usize,
    pub centroid: Centroid,
    /// Gaussian of `DecodeParams::sigma` centered at `centroid`, output-sized.
    pub rendered: Heatmap,
}

#[derive(Clone, Debug, Default)]
pub struct HeatmapDecoder {
    pub params: DecodeParams,
}

impl HeatmapDecoder {
    pub fn new(params: DecodeParams) -> Self {
        Self { params }
    }

    /// Resize and normalize one channel.
    ///
    /// A constant channel normalizes to nothing, so it is reported as an
    /// empty mask.
    pub fn prepare_channel(&self, channel: usize, map: &Heatmap) -> Result<Heatmap, DecodeError> {
        let p = &self.params;
        let resized = resize_bilinear(map, p.output_width, p.output_height)?;
        normalize_min_max(&resized).ok_or(DecodeError::EmptyMask { channel })
    }

    /// Centroid of a normalized, output-sized channel.
    pub fn locate(&self, channel: usize, normalized: &Heatmap) -> Result<Centroid, DecodeError> {
        let mask = binarize(normalized, self.params.threshold);
        Moments::of_mask(&mask)
            .centroid()
            .ok_or(DecodeError::EmptyMask { channel })
    }

    /// Decode one channel. `channel` only tags the result and errors.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, map), fields(width = map.width, height = map.height))
    )]
    pub fn decode_channel(
        &self,
        channel: usize,
        map: &Heatmap,
    ) -> Result<DecodedLandmark, DecodeError> {
        let normalized = self.prepare_channel(channel, map)?;
        let centroid = self.locate(channel, &normalized)?;
        log::trace!(
            "channel {} centroid row={} col={}",
            channel,
            centroid.row,
            centroid.col
        );
        let p = &self.params;
        Ok(DecodedLandmark {
            channel,
            centroid,
            rendered: render_gaussian(p.output_width, p.output_height, centroid, p.sigma),
        })
    }

    /// Decode every channel of a stack, in order.
    ///
    /// The first degenerate channel aborts decoding.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, stack), fields(channels = stack.len()))
    )]
    pub fn decode_stack(&self, stack: &HeatmapStack) -> Result<Vec<DecodedLandmark>, DecodeError> {
        let decoded = stack
            .iter()
            .enumerate()
            .map(|(channel, map)| self.decode_channel(channel, map))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("decoded {} landmark channels", decoded.len());
        Ok(decoded)
    }
}
