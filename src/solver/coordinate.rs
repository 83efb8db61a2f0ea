//! Dual coordinate-ascent QP backend
//!
//! Solves `min 0.5 * ||w||^2 + C * sum(slacks)` over the constraints added
//! so far via coordinate ascent on one Lagrange multiplier per constraint.
//! Constraints of the same training example share one slack, which in the
//! dual becomes the per-example budget `sum(alpha_r) <= C`. The primal
//! recovery is `w = clip(sum(alpha_r * row_r), lb, ub)`; clipping is the
//! exact minimizer of the Lagrangian under box bounds, so the returned
//! weights are always bound-feasible.

use crate::core::{QpSolution, QpSolver, Result, SosvmError};
use log::debug;

/// Default stopping tolerance on the largest multiplier step per pass
const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Default cap on coordinate-ascent passes per solve
const DEFAULT_MAX_PASSES: usize = 100_000;

/// In-process QP backend based on dual coordinate ascent
///
/// Multipliers are warm-started across `solve()` calls, so re-solving
/// after adding constraints resumes from the previous optimum.
pub struct CoordinateQpSolver {
    dim: usize,
    n_examples: usize,
    c: f64,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,

    rows: Vec<Vec<f64>>,
    bounds: Vec<f64>,
    owners: Vec<usize>,
    norms_sq: Vec<f64>,
    alpha: Vec<f64>,

    tolerance: f64,
    max_passes: usize,
}

impl CoordinateQpSolver {
    /// Create a solver with default tolerance and pass cap
    pub fn new() -> Self {
        Self {
            dim: 0,
            n_examples: 0,
            c: 1.0,
            lower: None,
            upper: None,
            rows: Vec::new(),
            bounds: Vec::new(),
            owners: Vec::new(),
            norms_sq: Vec::new(),
            alpha: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Override the inner stopping tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Override the inner pass cap
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Number of constraints currently held
    pub fn n_constraints(&self) -> usize {
        self.rows.len()
    }

    fn clip_component(&self, k: usize, v: f64) -> f64 {
        let mut w = v;
        if let Some(ref lower) = self.lower {
            w = w.max(lower[k]);
        }
        if let Some(ref upper) = self.upper {
            w = w.min(upper[k]);
        }
        w
    }

    fn recover_weights(&self, raw: &[f64]) -> Vec<f64> {
        (0..self.dim).map(|k| self.clip_component(k, raw[k])).collect()
    }

    fn compute_slacks(&self, weights: &[f64]) -> Vec<f64> {
        let mut slacks = vec![0.0; self.n_examples];
        for (r, row) in self.rows.iter().enumerate() {
            let violation = self.bounds[r] - dot(weights, row);
            let owner = self.owners[r];
            if violation > slacks[owner] {
                slacks[owner] = violation;
            }
        }
        slacks
    }
}

impl Default for CoordinateQpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl QpSolver for CoordinateQpSolver {
    fn set_problem(&mut self, dim: usize, n_examples: usize, c: f64) -> Result<()> {
        if !(c > 0.0) || !c.is_finite() {
            return Err(SosvmError::SolverFailure(format!(
                "regularization must be positive and finite, got {c}"
            )));
        }
        self.dim = dim;
        self.n_examples = n_examples;
        self.c = c;
        self.lower = None;
        self.upper = None;
        self.rows.clear();
        self.bounds.clear();
        self.owners.clear();
        self.norms_sq.clear();
        self.alpha.clear();
        Ok(())
    }

    fn set_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<()> {
        if lower.len() != self.dim {
            return Err(SosvmError::DimensionMismatch {
                expected: self.dim,
                actual: lower.len(),
            });
        }
        if upper.len() != self.dim {
            return Err(SosvmError::DimensionMismatch {
                expected: self.dim,
                actual: upper.len(),
            });
        }
        self.lower = Some(lower.to_vec());
        self.upper = Some(upper.to_vec());
        Ok(())
    }

    fn add_constraint(&mut self, row: &[f64], bound: f64, owner: usize) -> Result<()> {
        if row.len() != self.dim {
            return Err(SosvmError::DimensionMismatch {
                expected: self.dim,
                actual: row.len(),
            });
        }
        if owner >= self.n_examples {
            return Err(SosvmError::SolverFailure(format!(
                "constraint owner {owner} out of range for {} examples",
                self.n_examples
            )));
        }
        if !bound.is_finite() || row.iter().any(|v| !v.is_finite()) {
            return Err(SosvmError::SolverFailure(
                "non-finite constraint data".to_string(),
            ));
        }

        self.norms_sq.push(dot(row, row));
        self.rows.push(row.to_vec());
        self.bounds.push(bound);
        self.owners.push(owner);
        self.alpha.push(0.0);
        Ok(())
    }

    fn solve(&mut self) -> Result<QpSolution> {
        // Raw (unclipped) combination of constraint rows
        let mut raw = vec![0.0; self.dim];
        for (r, row) in self.rows.iter().enumerate() {
            if self.alpha[r] != 0.0 {
                axpy(&mut raw, self.alpha[r], row);
            }
        }

        let mut owner_sums = vec![0.0; self.n_examples];
        for (r, &owner) in self.owners.iter().enumerate() {
            owner_sums[owner] += self.alpha[r];
        }

        let mut weights = self.recover_weights(&raw);

        let mut passes = 0;
        loop {
            let mut max_step = 0.0f64;

            for r in 0..self.rows.len() {
                if self.norms_sq[r] <= f64::EPSILON {
                    // Zero row: only contributes through the slack
                    continue;
                }

                let owner = self.owners[r];
                let gradient = self.bounds[r] - dot(&weights, &self.rows[r]);
                let headroom = self.c - (owner_sums[owner] - self.alpha[r]);
                let target = (self.alpha[r] + gradient / self.norms_sq[r])
                    .clamp(0.0, headroom.max(0.0));
                let delta = target - self.alpha[r];
                if delta == 0.0 {
                    continue;
                }

                self.alpha[r] = target;
                owner_sums[owner] += delta;
                axpy(&mut raw, delta, &self.rows[r]);
                for (k, &v) in self.rows[r].iter().enumerate() {
                    if v != 0.0 {
                        weights[k] = self.clip_component(k, raw[k]);
                    }
                }

                let step = delta.abs() * self.norms_sq[r].sqrt();
                if step > max_step {
                    max_step = step;
                }
            }

            passes += 1;
            if max_step < self.tolerance || passes >= self.max_passes {
                debug!(
                    "qp solve finished after {passes} passes (last step {max_step:e}, {} constraints)",
                    self.rows.len()
                );
                break;
            }
        }

        let slacks = self.compute_slacks(&weights);
        let objective =
            0.5 * dot(&weights, &weights) + self.c * slacks.iter().sum::<f64>();

        if !objective.is_finite() || weights.iter().any(|v| !v.is_finite()) {
            return Err(SosvmError::SolverFailure(
                "solution diverged to non-finite values".to_string(),
            ));
        }

        Ok(QpSolution {
            weights,
            slacks,
            objective,
        })
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

fn axpy(target: &mut [f64], scale: f64, source: &[f64]) {
    for (t, &s) in target.iter_mut().zip(source.iter()) {
        *t += scale * s;
    }
}
