//! Rust implementation of cutting-plane training for structured-output SVMs
//!
//! Based on "Support Vector Machine Learning for Interdependent and
//! Structured Output Spaces" by Tsochantaridis, Hofmann, Joachims and Altun

pub mod api;
pub mod constraint;
pub mod core;
pub mod data;
pub mod model;
pub mod persistence;
pub mod solver;
pub mod trainer;

// Re-export main types for convenience
pub use crate::api::{SoSvm, TrainedSoSvm};
pub use crate::constraint::{ConstraintRecord, WorkingSet};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::MulticlassDataset;
pub use crate::model::MulticlassModel;
pub use crate::solver::CoordinateQpSolver;
pub use crate::trainer::CuttingPlaneTrainer;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
