//! Core type definitions for structured SVM training

/// Training example: an input pattern paired with its ground-truth
/// structured label
///
/// Owned by the caller and read-only during training. `P` and `L` are
/// whatever the structured model works with (sequences, trees, class
/// indices, ...).
#[derive(Clone, Debug)]
pub struct TrainingExample<P, L> {
    /// Input pattern
    pub pattern: P,
    /// Ground-truth structured label
    pub label: L,
}

impl<P, L> TrainingExample<P, L> {
    /// Create a new training example
    pub fn new(pattern: P, label: L) -> Self {
        Self { pattern, label }
    }
}

/// Output of one argmax oracle call
///
/// Describes the most-violating label for the current weights: the label
/// itself, the task loss it realizes, and the joint feature difference
/// `Psi(x, y_truth) - Psi(x, y_hat)`.
#[derive(Clone, Debug)]
pub struct ArgmaxResult<L> {
    /// Label maximizing score plus loss under the current weights
    pub label: L,
    /// Task loss of that label against the ground truth (>= 0)
    pub loss: f64,
    /// Feature difference `Psi(x, y_truth) - Psi(x, y_hat)`
    pub feature_difference: Vec<f64>,
}

/// Solution returned by a QP backend
#[derive(Clone, Debug)]
pub struct QpSolution {
    /// Primal weight vector
    pub weights: Vec<f64>,
    /// Slack variables, one per training example, all >= 0
    pub slacks: Vec<f64>,
    /// Primal objective `0.5 * ||w||^2 + C * sum(slacks)`
    pub objective: f64,
}

/// Configuration for the cutting-plane trainer
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Regularization constant (margin vs. slack penalty trade-off)
    pub c: f64,
    /// Convergence tolerance on the slack gap
    pub epsilon: f64,
    /// Optional sweep guard; exceeding it is a ConvergenceFailure
    pub max_iterations: Option<usize>,
    /// Similarity (one minus relative Euclidean distance) above which
    /// two constraint rows for the same example count as near-identical
    pub dedup_threshold: f64,
    /// Optional per-weight lower bounds (length = feature dimension)
    pub lower_bounds: Option<Vec<f64>>,
    /// Optional per-weight upper bounds (length = feature dimension)
    pub upper_bounds: Option<Vec<f64>>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.001,
            max_iterations: None,
            dedup_threshold: 0.9999,
            lower_bounds: None,
            upper_bounds: None,
        }
    }
}

/// Result of a convergent training run
#[derive(Debug, Clone)]
pub struct TrainingResult {
    /// Final weight vector
    pub weights: Vec<f64>,
    /// Final slack variables, one per training example
    pub slacks: Vec<f64>,
    /// Final primal objective value
    pub objective: f64,
    /// Number of sweeps performed (including the final clean one)
    pub sweeps: usize,
    /// Number of constraints retained in the final working set
    pub n_constraints: usize,
}
