use serde::{Deserialize, Serialize};

/// Shape of the stacked heatmap network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseNetConfig {
    /// Number of sequential refinement stacks.
    pub nstack: usize,
    /// Number of output heatmap channels (landmarks).
    pub oup_dim: usize,
    /// Output heatmap width in pixels.
    pub heatmap_width: usize,
    /// Output heatmap height in pixels.
    pub heatmap_height: usize,
}

impl Default for PoseNetConfig {
    fn default() -> Self {
        Self {
            nstack: 8,
            oup_dim: 32,
            heatmap_width: 80,
            heatmap_height: 48,
        }
    }
}
