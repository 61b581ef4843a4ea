use eyemark_core::DecodeError;

/// Errors raised while reading or interpreting a checkpoint.
#[derive(thiserror::Error, Debug)]
pub enum CheckpointError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("missing parameter `{0}` in model_state_dict")]
    MissingKey(String),

    #[error("parameter `{name}` has shape {got:?}, expected {expected:?}")]
    Shape {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("parameter `{name}` holds {got} values but its shape needs {expected}")]
    DataLength {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// Errors returned by [`crate::PoseModel::forward`] and model construction.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("invalid network configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Heatmap(#[from] DecodeError),
}
