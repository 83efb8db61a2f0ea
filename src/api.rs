//! High-level API for structured SVM training
//!
//! This module provides a builder-style interface around the
//! cutting-plane trainer for common workflows.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sosvm::api::SoSvm;
//! use sosvm::core::TrainingExample;
//! use sosvm::model::MulticlassModel;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let examples = vec![
//!     TrainingExample::new(vec![2.0], 0usize),
//!     TrainingExample::new(vec![-2.0], 1usize),
//! ];
//!
//! let trained = SoSvm::new()
//!     .with_c(1.0)
//!     .with_epsilon(0.001)
//!     .train(MulticlassModel::new(1, 2), &examples)?;
//!
//! println!("objective: {}", trained.objective());
//! # Ok(())
//! # }
//! ```

use crate::core::{QpSolver, Result, StructuredModel, TrainerConfig, TrainingExample, TrainingResult};
use crate::model::MulticlassModel;
use crate::solver::CoordinateQpSolver;
use crate::trainer::CuttingPlaneTrainer;

/// Builder-style front end to the cutting-plane trainer
pub struct SoSvm {
    config: TrainerConfig,
}

impl SoSvm {
    /// Create a builder with default parameters
    pub fn new() -> Self {
        Self {
            config: TrainerConfig::default(),
        }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Set the sweep guard
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = Some(max_iterations);
        self
    }

    /// Set the near-identical similarity threshold for constraint
    /// deduplication
    pub fn with_dedup_threshold(mut self, threshold: f64) -> Self {
        self.config.dedup_threshold = threshold;
        self
    }

    /// Set per-weight box bounds
    pub fn with_bounds(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.config.lower_bounds = Some(lower);
        self.config.upper_bounds = Some(upper);
        self
    }

    /// Train with the bundled in-process QP backend
    pub fn train<M: StructuredModel>(
        self,
        model: M,
        examples: &[TrainingExample<M::Pattern, M::Label>],
    ) -> Result<TrainedSoSvm<M>> {
        let mut solver = CoordinateQpSolver::new();
        self.train_with_solver(model, examples, &mut solver)
    }

    /// Train with a caller-supplied QP backend
    pub fn train_with_solver<M: StructuredModel, S: QpSolver>(
        self,
        model: M,
        examples: &[TrainingExample<M::Pattern, M::Label>],
        solver: &mut S,
    ) -> Result<TrainedSoSvm<M>> {
        let trainer = CuttingPlaneTrainer::new(self.config.clone());
        let result = trainer.train(examples, &model, solver)?;
        Ok(TrainedSoSvm {
            model,
            result,
            config: self.config,
        })
    }

    /// Get the accumulated configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }
}

impl Default for SoSvm {
    fn default() -> Self {
        Self::new()
    }
}

/// A trained structured model: the model plus the weights and slacks the
/// trainer produced for it
pub struct TrainedSoSvm<M: StructuredModel> {
    model: M,
    result: TrainingResult,
    config: TrainerConfig,
}

impl<M: StructuredModel> TrainedSoSvm<M> {
    /// Final weight vector
    pub fn weights(&self) -> &[f64] {
        &self.result.weights
    }

    /// Final slack variables
    pub fn slacks(&self) -> &[f64] {
        &self.result.slacks
    }

    /// Final primal objective
    pub fn objective(&self) -> f64 {
        self.result.objective
    }

    /// Number of sweeps the trainer ran
    pub fn sweeps(&self) -> usize {
        self.result.sweeps
    }

    /// Number of constraints retained in the working set
    pub fn n_constraints(&self) -> usize {
        self.result.n_constraints
    }

    /// The structured model
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The configuration used for training
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// The full training result
    pub fn result(&self) -> &TrainingResult {
        &self.result
    }
}

impl TrainedSoSvm<MulticlassModel> {
    /// Predict the class of a pattern
    pub fn predict(&self, pattern: &[f64]) -> usize {
        self.model.predict(&self.result.weights, pattern)
    }

    /// Fraction of examples whose predicted class matches the label
    pub fn evaluate(&self, examples: &[TrainingExample<Vec<f64>, usize>]) -> f64 {
        if examples.is_empty() {
            return 0.0;
        }
        let correct = examples
            .iter()
            .filter(|example| self.predict(&example.pattern) == example.label)
            .count();
        correct as f64 / examples.len() as f64
    }
}
