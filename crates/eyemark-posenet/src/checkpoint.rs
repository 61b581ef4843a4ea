//! JSON checkpoint format.
//!
//! ```json
//! { "model_state_dict": { "stacks.0.head.weight": { "shape": [32], "data": [...] } } }
//! ```

use crate::CheckpointError;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

/// Checkpoint path used when none is configured.
pub const DEFAULT_CHECKPOINT_PATH: &str = "checkpoint";

/// Dense row-major tensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TensorData {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl TensorData {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Parameter name -> tensor.
pub type StateDict = BTreeMap<String, TensorData>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub model_state_dict: StateDict,
}

impl Checkpoint {
    pub fn new(model_state_dict: StateDict) -> Self {
        Self { model_state_dict }
    }

    /// Load a checkpoint from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this checkpoint to disk as JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Fetch a parameter, checking its shape and buffer length.
    pub fn param(&self, name: &str, expected: &[usize]) -> Result<&TensorData, CheckpointError> {
        let t = self
            .model_state_dict
            .get(name)
            .ok_or_else(|| CheckpointError::MissingKey(name.to_string()))?;
        if t.shape != expected {
            return Err(CheckpointError::Shape {
                name: name.to_string(),
                expected: expected.to_vec(),
                got: t.shape.clone(),
            });
        }
        if t.data.len() != t.numel() {
            return Err(CheckpointError::DataLength {
                name: name.to_string(),
                expected: t.numel(),
                got: t.data.len(),
            });
        }
        Ok(t)
    }
}
