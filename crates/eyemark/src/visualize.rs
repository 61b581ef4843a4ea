//! Four-panel comparison figure.

use eyemark_core::Heatmap;
use image::{imageops, imageops::FilterType, Rgb, RgbImage};
use std::path::Path;

const GAP_PX: u32 = 4;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(thiserror::Error, Debug)]
pub enum VisualizeError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("cannot render an empty panel")]
    EmptyPanel,
    #[error("figure needs at least one panel")]
    NoPanels,
}

/// Scale a map to 8 bits and expand it to gray RGB.
pub fn heatmap_panel(map: &Heatmap) -> RgbImage {
    let gray = map.to_luma8();
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}

/// Panels scaled to a common height and laid out left to right.
pub struct Figure {
    panels: Vec<RgbImage>,
    height: u32,
}

impl Figure {
    pub fn new(height: u32) -> Self {
        Self {
            panels: Vec::new(),
            height,
        }
    }

    /// Append a panel, resized to the figure height with its aspect kept.
    pub fn push(&mut self, panel: &RgbImage) -> Result<(), VisualizeError> {
        let (w, h) = panel.dimensions();
        if w == 0 || h == 0 || self.height == 0 {
            return Err(VisualizeError::EmptyPanel);
        }
        let width = ((w as f64 * self.height as f64 / h as f64).round() as u32).max(1);
        let scaled = if (width, self.height) == (w, h) {
            panel.clone()
        } else {
            imageops::resize(panel, width, self.height, FilterType::Triangle)
        };
        self.panels.push(scaled);
        Ok(())
    }

    pub fn push_heatmap(&mut self, map: &Heatmap) -> Result<(), VisualizeError> {
        self.push(&heatmap_panel(map))
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn render(&self) -> Result<RgbImage, VisualizeError> {
        if self.panels.is_empty() {
            return Err(VisualizeError::NoPanels);
        }
        let total_w = self.panels.iter().map(|p| p.width()).sum::<u32>()
            + GAP_PX * (self.panels.len() as u32 - 1);
        let mut canvas = RgbImage::from_pixel(total_w, self.height, BACKGROUND);
        let mut x = 0i64;
        for p in &self.panels {
            imageops::replace(&mut canvas, p, x, 0);
            x += (p.width() + GAP_PX) as i64;
        }
        Ok(canvas)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), VisualizeError> {
        self.render()?.save(path)?;
        Ok(())
    }
}
