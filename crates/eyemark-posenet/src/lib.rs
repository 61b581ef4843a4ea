//! Pose network runner for eyemark.
//!
//! The network is a seam: [`PoseModel`] maps one preprocessed grayscale
//! image to `nstack` heatmap stacks. [`PriorHeadNet`] is the bundled
//! implementation, parameterized by a JSON `checkpoint` file or by a
//! seeded random initialization when no checkpoint is present.

mod checkpoint;
mod config;
mod error;
mod model;
mod prior_head;

pub use checkpoint::{Checkpoint, StateDict, TensorData, DEFAULT_CHECKPOINT_PATH};
pub use config::PoseNetConfig;
pub use error::{CheckpointError, ModelError};
pub use model::{PoseModel, StackOutput};
pub use prior_head::{load_optional, ModelSource, PriorHeadNet};
