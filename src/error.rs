use thiserror::Error;

/// Errors raised by the cascade model, its trainers and the detector.
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The model stream ended before the layout implied by its header.
    #[error("model data truncated while reading {what}")]
    Truncated { what: &'static str },

    #[error("malformed model: {0}")]
    Malformed(String),

    #[error("patch {width}x{height} is too small for feature evaluation")]
    PatchTooSmall { width: usize, height: usize },

    #[error("feature point ({row}, {col}) lies outside a {width}x{height} patch")]
    FeatureOutOfBounds {
        row: i64,
        col: i64,
        width: usize,
        height: usize,
    },

    #[error("target TPR {min_tpr} not reached after {steps} threshold steps")]
    UnreachableTpr { min_tpr: f32, steps: usize },

    #[error("invalid parameter: {0}")]
    InvalidParams(String),

    #[error("invalid training data: {0}")]
    InvalidData(String),

    #[error("dataset error: {0}")]
    Dataset(String),
}

pub type Result<T> = std::result::Result<T, CascadeError>;
