//! Collaboration contracts for structured SVM training
//!
//! The trainer only ever talks to the structured model and the QP backend
//! through these two traits; both are externally owned and pluggable.

use crate::core::{ArgmaxResult, QpSolution, Result, TrainingExample};

/// Structured prediction model: joint feature map, task loss, and the
/// most-violated-constraint oracle
pub trait StructuredModel {
    /// Input pattern type
    type Pattern;
    /// Structured label type
    type Label;

    /// Dimensionality of the joint feature map (= weight vector length)
    fn dim(&self) -> usize;

    /// Find the label maximizing `<weights, Psi(x, y)> + loss(y_truth, y)`
    ///
    /// Must be a pure function of its inputs. May be expensive
    /// (combinatorial search) but is expected to terminate. Returns the
    /// maximizing label, its task loss, and the feature difference
    /// `Psi(x, y_truth) - Psi(x, y_hat)`.
    fn argmax(
        &self,
        weights: &[f64],
        example: &TrainingExample<Self::Pattern, Self::Label>,
    ) -> Result<ArgmaxResult<Self::Label>>;
}

/// Quadratic program backend for the cutting-plane working set
///
/// Solves `min 0.5 * ||w||^2 + C * sum(slacks)` subject to every added
/// constraint `<w, row> >= bound - slack[owner]`, `slack >= 0`, and
/// optional box bounds `lb <= w <= ub`. The backend, not the trainer,
/// guarantees correctness of the returned optimum.
pub trait QpSolver {
    /// Announce problem shape and regularization before any constraint
    /// is added; resets previously accumulated constraints
    fn set_problem(&mut self, dim: usize, n_examples: usize, c: f64) -> Result<()>;

    /// Set box bounds on the weight vector (both of length `dim`)
    fn set_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<()>;

    /// Append one inequality `<w, row> >= bound - slack[owner]`
    fn add_constraint(&mut self, row: &[f64], bound: f64, owner: usize) -> Result<()>;

    /// Solve the QP over all constraints added so far
    fn solve(&mut self) -> Result<QpSolution>;
}
