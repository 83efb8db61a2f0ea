//! Error types for structured SVM training

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SosvmError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Oracle failed on example {example}: {message}")]
    OracleFailure { example: usize, message: String },

    #[error("QP solver failed: {0}")]
    SolverFailure(String),

    #[error("No convergence after {sweeps} sweeps (objective {objective}, slack gap {slack_gap})")]
    ConvergenceFailure {
        sweeps: usize,
        objective: f64,
        slack_gap: f64,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, SosvmError>;
