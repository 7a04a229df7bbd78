//! Error type shared by the tangles pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TanglesError>;

#[derive(Debug, Error)]
pub enum TanglesError {
    #[error("no cuts given")]
    NoCuts,

    #[error("no points given")]
    NoPoints,

    #[error("cut {index} has {found} points, expected {expected}")]
    CutLengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("got {num_cuts} cuts but {num_costs} costs")]
    CostLengthMismatch { num_cuts: usize, num_costs: usize },

    #[error("{0} cuts exceed the maximum of {max}", max = u16::MAX)]
    TooManyCuts(usize),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("soft predictions have not been computed")]
    PredictionsMissing,

    #[error("leaf {0} does not exist")]
    UnknownLeaf(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
