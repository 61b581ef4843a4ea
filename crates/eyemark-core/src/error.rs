/// Errors produced while building heatmaps or decoding landmarks.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("invalid heatmap dimensions (width={width}, height={height})")]
    InvalidSize { width: usize, height: usize },

    #[error("invalid heatmap buffer length (expected {expected} values, got {got})")]
    BufferLength { expected: usize, got: usize },

    #[error("heatmap size mismatch (expected {expected:?}, got {got:?})")]
    MismatchedSize {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("heatmap stack has no channels")]
    EmptyStack,

    /// No pixel survives thresholding. Constant channels, all-zero ones
    /// included, land here because they have no range to normalize.
    #[error("channel {channel} has an empty mask after thresholding")]
    EmptyMask { channel: usize },
}
