//! Error types for the scoring-model boundary.
//!
//! Search itself never fails: a position without moves is reported as `None`.
//! Only loading and running a scoring model can go wrong.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, encoding for, or running a scoring model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model weights from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid weight '{token}' at position {index}")]
    Parse { index: usize, token: String },

    #[error("model needs at least a bias term")]
    Empty,

    #[error("input width mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("model returned {actual} scores for a batch of {expected}")]
    BatchSize { expected: usize, actual: usize },

    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("non-finite value in model output")]
    NonFinite,
}
