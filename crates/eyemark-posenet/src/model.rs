use crate::{ModelError, PoseNetConfig};
use eyemark_core::{Heatmap, HeatmapStack};

/// Heatmaps of every refinement stack from one forward pass.
#[derive(Clone, Debug)]
pub struct StackOutput {
    pub stacks: Vec<HeatmapStack>,
}

impl StackOutput {
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Output of the final refinement stack, the one that gets decoded.
    pub fn last(&self) -> Option<&HeatmapStack> {
        self.stacks.last()
    }

    pub fn into_last(self) -> Option<HeatmapStack> {
        self.stacks.into_iter().last()
    }
}

/// A stacked heatmap network used for inference only.
pub trait PoseModel {
    fn config(&self) -> &PoseNetConfig;

    /// Run one forward pass on a preprocessed grayscale image.
    fn forward(&self, img: &Heatmap) -> Result<StackOutput, ModelError>;
}
