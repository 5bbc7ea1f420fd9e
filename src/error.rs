use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// One violated dimension found while validating a layer's parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeViolation {
    /// Outer length of the weight matrix differs from `num_nodes_in`.
    WeightRows { expected: usize, actual: usize },
    /// A weight row whose length differs from `num_nodes_out`.
    WeightRowLength { row: usize, expected: usize, actual: usize },
    /// Bias vector length differs from `num_nodes_out`.
    BiasLength { expected: usize, actual: usize },
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeViolation::WeightRows { expected, actual } => write!(
                f,
                "number of weight sets must match num_nodes_in (expected {expected}, got {actual})"
            ),
            ShapeViolation::WeightRowLength { row, expected, actual } => write!(
                f,
                "weight row {row} must match num_nodes_out (expected {expected}, got {actual})"
            ),
            ShapeViolation::BiasLength { expected, actual } => write!(
                f,
                "number of biases must match num_nodes_out (expected {expected}, got {actual})"
            ),
        }
    }
}

fn join_violations(violations: &[ShapeViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("shape mismatch: {}", join_violations(.0))]
    ShapeMismatch(Vec<ShapeViolation>),

    #[error("cannot compute the mean cost of an empty dataset")]
    EmptyDataset,

    #[error("width mismatch: expected {expected} values, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("label {label} out of range for {num_labels} labels")]
    InvalidLabel { label: usize, num_labels: usize },

    #[error("corrupt checkpoint at {}: {reason}", .path.display())]
    CorruptCheckpoint { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("training session has shut down")]
    SessionClosed,
}
