//! Min/max intensity normalization.

use crate::Heatmap;

/// Map values linearly so the minimum becomes 0 and the maximum becomes 1.
///
/// Returns `None` when the value range is zero or not finite.
pub fn normalize_min_max(map: &Heatmap) -> Option<Heatmap> {
    let (lo, hi) = map.min_max()?;
    let range = hi - lo;
    if !(range > 0.0 && range.is_finite()) {
        return None;
    }
    let inv = 1.0 / range;
    Some(Heatmap {
        width: map.width,
        height: map.height,
        data: map.data.iter().map(|&v| (v - lo) * inv).collect(),
    })
}

/// Lazily normalize a sequence of maps.
///
/// Each item is `None` where the corresponding map is constant. Calling this
/// again over the same slice restarts the sequence.
pub fn normalize_all(maps: &[Heatmap]) -> impl Iterator<Item = Option<Heatmap>> + '_ {
    maps.iter().map(normalize_min_max)
}
