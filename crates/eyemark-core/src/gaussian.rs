use crate::{Centroid, Heatmap};

/// Render an isotropic 2D Gaussian with unit peak at `center`.
pub fn render_gaussian(width: usize, height: usize, center: Centroid, sigma: f32) -> Heatmap {
    render_gaussian_at(width, height, center.row as f32, center.col as f32, sigma)
}

/// Same as [`render_gaussian`] for a sub-pixel `(row, col)` center.
pub fn render_gaussian_at(width: usize, height: usize, row: f32, col: f32, sigma: f32) -> Heatmap {
    let denom = 2.0 * sigma * sigma;
    Heatmap::from_fn(width, height, |r, c| {
        let dr = r as f32 - row;
        let dc = c as f32 - col;
        (-(dr * dr + dc * dc) / denom).exp()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn peak_sits_at_center() {
        let g = render_gaussian(150, 90, Centroid::new(45, 75), 3.0);
        assert_eq!(g.size(), (150, 90));
        assert_eq!(g.argmax(), Some((45, 75)));
        assert_abs_diff_eq!(g.get(45, 75), 1.0);
        // One sigma away along a single axis.
        assert_abs_diff_eq!(g.get(45, 78), (-0.5f32).exp(), epsilon = 1e-6);
        assert_abs_diff_eq!(g.get(42, 75), (-0.5f32).exp(), epsilon = 1e-6);
    }

    #[test]
    fn subpixel_center_is_symmetric() {
        let g = render_gaussian_at(8, 1, 0.0, 3.5, 1.0);
        assert_abs_diff_eq!(g.get(0, 3), g.get(0, 4), epsilon = 1e-6);
    }
}
