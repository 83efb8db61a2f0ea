//! Cutting-plane training loop for structured-output SVMs
//!
//! The trainer repeatedly asks the structured model for each example's
//! most-violating label, turns violations beyond tolerance into linear
//! constraints, and re-solves the growing QP until a full sweep finds no
//! violation. On convergence every example's realized slack is within
//! epsilon of the slack its most-violating label would demand.

use crate::constraint::{ConstraintRecord, WorkingSet};
use crate::core::{
    QpSolver, Result, SosvmError, StructuredModel, TrainerConfig, TrainingExample, TrainingResult,
};
use log::{debug, info};

/// Drives the cutting-plane loop to convergence
///
/// Holds the training configuration; the structured model and the QP
/// backend are borrowed per `train` call and stay externally owned.
pub struct CuttingPlaneTrainer {
    config: TrainerConfig,
}

impl CuttingPlaneTrainer {
    /// Create a trainer with the given configuration
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Get the trainer configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train on the given examples, driving `solver` with constraints
    /// produced by `model`
    ///
    /// The QP is re-solved once per full sweep (all argmax calls within a
    /// sweep therefore observe the same weight vector). Returns the final
    /// weights, slacks and primal objective, or one of the typed
    /// failures; no partial result is ever produced.
    pub fn train<M, S>(
        &self,
        examples: &[TrainingExample<M::Pattern, M::Label>],
        model: &M,
        solver: &mut S,
    ) -> Result<TrainingResult>
    where
        M: StructuredModel,
        S: QpSolver,
    {
        let dim = model.dim();
        self.validate(examples.len(), dim)?;

        let n = examples.len();
        solver.set_problem(dim, n, self.config.c)?;
        if let (Some(lower), Some(upper)) = (
            self.config.lower_bounds.as_ref(),
            self.config.upper_bounds.as_ref(),
        ) {
            solver.set_bounds(lower, upper)?;
        }

        let mut working_set = WorkingSet::new(n, self.config.dedup_threshold);
        let mut weights = vec![0.0; dim];
        let mut slacks = vec![0.0; n];
        let mut objective = 0.0;
        let mut sweeps = 0;

        loop {
            if let Some(max) = self.config.max_iterations {
                if sweeps >= max {
                    let slack_gap =
                        self.largest_slack_gap(examples, model, &weights, &slacks)?;
                    return Err(SosvmError::ConvergenceFailure {
                        sweeps,
                        objective,
                        slack_gap,
                    });
                }
            }
            sweeps += 1;

            let mut added = 0;
            for (i, example) in examples.iter().enumerate() {
                let result = match model.argmax(&weights, example) {
                    Ok(result) => result,
                    Err(error) => {
                        return Err(SosvmError::OracleFailure {
                            example: i,
                            message: error.to_string(),
                        })
                    }
                };
                if result.feature_difference.len() != dim {
                    return Err(SosvmError::OracleFailure {
                        example: i,
                        message: format!(
                            "feature difference has length {}, expected {dim}",
                            result.feature_difference.len()
                        ),
                    });
                }
                if !result.loss.is_finite() || result.loss < 0.0 {
                    return Err(SosvmError::OracleFailure {
                        example: i,
                        message: format!("invalid loss {}", result.loss),
                    });
                }

                let slack_candidate =
                    result.loss - dot(&weights, &result.feature_difference);
                if slack_candidate > slacks[i] + self.config.epsilon {
                    let record =
                        ConstraintRecord::new(result.feature_difference, result.loss, i);
                    // Every violation beyond tolerance reaches the QP,
                    // even when the working set judges the row redundant;
                    // only the re-solve can raise the slack to cover it
                    solver.add_constraint(&record.feature_difference, record.bound, i)?;
                    working_set.insert(record);
                    added += 1;
                }
            }

            if added == 0 {
                info!(
                    "converged after {sweeps} sweeps with {} constraints (objective {objective})",
                    working_set.len()
                );
                return Ok(TrainingResult {
                    weights,
                    slacks,
                    objective,
                    sweeps,
                    n_constraints: working_set.len(),
                });
            }

            let solution = solver.solve()?;
            if solution.weights.len() != dim {
                return Err(SosvmError::SolverFailure(format!(
                    "solver returned {} weights, expected {dim}",
                    solution.weights.len()
                )));
            }
            if solution.slacks.len() != n {
                return Err(SosvmError::SolverFailure(format!(
                    "solver returned {} slacks, expected {n}",
                    solution.slacks.len()
                )));
            }
            weights = solution.weights;
            slacks = solution.slacks;
            objective = solution.objective;

            debug!(
                "sweep {sweeps}: {added} violations, {} constraints total, objective {objective}",
                working_set.len()
            );
        }
    }

    fn validate(&self, n_examples: usize, dim: usize) -> Result<()> {
        if n_examples == 0 {
            return Err(SosvmError::EmptyDataset);
        }
        if !(self.config.c > 0.0) || !self.config.c.is_finite() {
            return Err(SosvmError::InvalidParameter(format!(
                "C must be positive and finite, got {}",
                self.config.c
            )));
        }
        if !(self.config.epsilon > 0.0) || !self.config.epsilon.is_finite() {
            return Err(SosvmError::InvalidParameter(format!(
                "epsilon must be positive and finite, got {}",
                self.config.epsilon
            )));
        }
        if !(self.config.dedup_threshold > 0.0) || self.config.dedup_threshold > 1.0 {
            return Err(SosvmError::InvalidParameter(format!(
                "dedup threshold must lie in (0, 1], got {}",
                self.config.dedup_threshold
            )));
        }

        match (
            self.config.lower_bounds.as_ref(),
            self.config.upper_bounds.as_ref(),
        ) {
            (None, None) => {}
            (Some(lower), Some(upper)) => {
                if lower.len() != dim {
                    return Err(SosvmError::DimensionMismatch {
                        expected: dim,
                        actual: lower.len(),
                    });
                }
                if upper.len() != dim {
                    return Err(SosvmError::DimensionMismatch {
                        expected: dim,
                        actual: upper.len(),
                    });
                }
                for (k, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
                    if lo > hi {
                        return Err(SosvmError::InvalidParameter(format!(
                            "lower bound {lo} exceeds upper bound {hi} at index {k}"
                        )));
                    }
                }
            }
            _ => {
                return Err(SosvmError::InvalidParameter(
                    "lower and upper bounds must be given together".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Largest `slack_candidate - slacks[i]` over all examples, for
    /// diagnosing a failed run
    fn largest_slack_gap<M>(
        &self,
        examples: &[TrainingExample<M::Pattern, M::Label>],
        model: &M,
        weights: &[f64],
        slacks: &[f64],
    ) -> Result<f64>
    where
        M: StructuredModel,
    {
        let mut gap = 0.0f64;
        for (i, example) in examples.iter().enumerate() {
            let result = match model.argmax(weights, example) {
                Ok(result) => result,
                Err(error) => {
                    return Err(SosvmError::OracleFailure {
                        example: i,
                        message: error.to_string(),
                    })
                }
            };
            let candidate = result.loss - dot(weights, &result.feature_difference);
            gap = gap.max(candidate - slacks[i]);
        }
        Ok(gap)
    }
}

impl Default for CuttingPlaneTrainer {
    fn default() -> Self {
        Self::new(TrainerConfig::default())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArgmaxResult, QpSolution, TrainerConfig};
    use crate::model::MulticlassModel;
    use crate::solver::CoordinateQpSolver;
    use approx::assert_abs_diff_eq;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn separable_examples() -> Vec<TrainingExample<Vec<f64>, usize>> {
        vec![
            TrainingExample::new(vec![2.0], 0usize),
            TrainingExample::new(vec![-2.0], 1usize),
        ]
    }

    #[test]
    fn test_separable_pair_converges_quickly() {
        let model = MulticlassModel::new(1, 2);
        let mut solver = CoordinateQpSolver::new();
        let trainer = CuttingPlaneTrainer::new(TrainerConfig {
            epsilon: 0.01,
            ..TrainerConfig::default()
        });

        let result = trainer
            .train(&separable_examples(), &model, &mut solver)
            .expect("training should converge");

        assert!(result.sweeps <= 3);
        assert_eq!(result.n_constraints, 2);
        for &slack in &result.slacks {
            assert_abs_diff_eq!(slack, 0.0, epsilon = 0.01);
        }
        // Both patterns end up classified correctly
        assert_eq!(model.predict(&result.weights, &[2.0]), 0);
        assert_eq!(model.predict(&result.weights, &[-2.0]), 1);
    }

    #[test]
    fn test_conflicting_pair_converges_with_unavoidable_slack() {
        // Identical patterns, opposite labels: the QP absorbs the
        // unavoidable 0/1 loss into the slacks and training converges
        let model = MulticlassModel::new(1, 2);
        let mut solver = CoordinateQpSolver::new();
        let trainer = CuttingPlaneTrainer::default();

        let examples = vec![
            TrainingExample::new(vec![1.0], 0usize),
            TrainingExample::new(vec![1.0], 1usize),
        ];
        let result = trainer
            .train(&examples, &model, &mut solver)
            .expect("training should converge");

        assert_abs_diff_eq!(result.slacks[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.slacks[1], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.objective, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_termination_slack_guarantee() {
        let model = MulticlassModel::new(1, 3);
        let mut solver = CoordinateQpSolver::new();
        let epsilon = 1e-4;
        let trainer = CuttingPlaneTrainer::new(TrainerConfig {
            epsilon,
            ..TrainerConfig::default()
        });

        let examples = vec![
            TrainingExample::new(vec![1.0], 0usize),
            TrainingExample::new(vec![-1.0], 1usize),
        ];
        let result = trainer
            .train(&examples, &model, &mut solver)
            .expect("training should converge");

        // Every example's most-violating label demands no more slack
        // than was granted, up to epsilon
        for (i, example) in examples.iter().enumerate() {
            let best = model.argmax(&result.weights, example).unwrap();
            let demanded = best.loss - dot(&result.weights, &best.feature_difference);
            assert!(result.slacks[i] >= demanded - epsilon);
        }
    }

    #[test]
    fn test_objective_monotone_across_sweeps() {
        struct RecordingSolver {
            inner: CoordinateQpSolver,
            objectives: Rc<RefCell<Vec<f64>>>,
        }

        impl QpSolver for RecordingSolver {
            fn set_problem(&mut self, dim: usize, n_examples: usize, c: f64) -> Result<()> {
                self.inner.set_problem(dim, n_examples, c)
            }
            fn set_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<()> {
                self.inner.set_bounds(lower, upper)
            }
            fn add_constraint(&mut self, row: &[f64], bound: f64, owner: usize) -> Result<()> {
                self.inner.add_constraint(row, bound, owner)
            }
            fn solve(&mut self) -> Result<QpSolution> {
                let solution = self.inner.solve()?;
                self.objectives.borrow_mut().push(solution.objective);
                Ok(solution)
            }
        }

        let objectives = Rc::new(RefCell::new(Vec::new()));
        let mut solver = RecordingSolver {
            inner: CoordinateQpSolver::new(),
            objectives: Rc::clone(&objectives),
        };

        // Three classes over one feature force a second round of
        // violations once the first solve separates the first two
        let model = MulticlassModel::new(1, 3);
        let trainer = CuttingPlaneTrainer::new(TrainerConfig {
            epsilon: 1e-6,
            ..TrainerConfig::default()
        });
        let examples = vec![
            TrainingExample::new(vec![1.0], 0usize),
            TrainingExample::new(vec![-1.0], 1usize),
        ];

        trainer
            .train(&examples, &model, &mut solver)
            .expect("training should converge");

        let history = objectives.borrow();
        assert!(history.len() >= 2, "expected at least two re-solves");
        for pair in history.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-9);
        }
    }

    #[test]
    fn test_box_bounds_respected() {
        let model = MulticlassModel::new(1, 2);
        let mut solver = CoordinateQpSolver::new();
        let trainer = CuttingPlaneTrainer::new(TrainerConfig {
            lower_bounds: Some(vec![-0.05, -0.05]),
            upper_bounds: Some(vec![0.05, 0.05]),
            ..TrainerConfig::default()
        });

        let result = trainer
            .train(&separable_examples(), &model, &mut solver)
            .expect("training should converge");

        for &w in &result.weights {
            assert!((-0.05..=0.05).contains(&w));
        }
        // The tight box leaves real slack behind
        assert!(result.slacks.iter().any(|&s| s > 0.5));
    }

    #[test]
    fn test_colinear_violation_still_raises_slack() {
        // A violating row colinear with an earlier one for the same
        // example must still reach the QP; otherwise no re-solve could
        // ever raise the slack to cover it
        struct ScriptedModel {
            first_call_done: Cell<bool>,
        }

        impl StructuredModel for ScriptedModel {
            type Pattern = usize;
            type Label = usize;

            fn dim(&self) -> usize {
                2
            }

            fn argmax(
                &self,
                _weights: &[f64],
                example: &TrainingExample<usize, usize>,
            ) -> Result<ArgmaxResult<usize>> {
                Ok(match example.pattern {
                    0 => {
                        if self.first_call_done.get() {
                            ArgmaxResult {
                                label: 0,
                                loss: 1.0,
                                feature_difference: vec![2.0, 0.0],
                            }
                        } else {
                            self.first_call_done.set(true);
                            ArgmaxResult {
                                label: 0,
                                loss: 1.0,
                                feature_difference: vec![1.0, 0.0],
                            }
                        }
                    }
                    // Pulls the first weight negative, so the scaled
                    // row above demands strictly more slack than the
                    // original one
                    _ => ArgmaxResult {
                        label: 0,
                        loss: 5.0,
                        feature_difference: vec![-2.0, 0.0],
                    },
                })
            }
        }

        let model = ScriptedModel {
            first_call_done: Cell::new(false),
        };
        let mut solver = CoordinateQpSolver::new();
        let epsilon = 0.01;
        let trainer = CuttingPlaneTrainer::new(TrainerConfig {
            epsilon,
            max_iterations: Some(50),
            ..TrainerConfig::default()
        });
        let examples = vec![
            TrainingExample::new(0usize, 0usize),
            TrainingExample::new(1usize, 0usize),
        ];

        let result = trainer
            .train(&examples, &model, &mut solver)
            .expect("training should converge");

        for (i, example) in examples.iter().enumerate() {
            let best = model.argmax(&result.weights, example).unwrap();
            let demanded = best.loss - dot(&result.weights, &best.feature_difference);
            assert!(
                result.slacks[i] >= demanded - epsilon,
                "slack {} does not cover demand {} for example {}",
                result.slacks[i],
                demanded,
                i
            );
        }
    }

    #[test]
    fn test_convergence_failure_on_unstable_oracle() {
        // An oracle whose loss grows every sweep never stabilizes; the
        // iteration guard must turn that into a typed failure
        struct GrowingLossModel {
            calls: Cell<usize>,
        }

        impl StructuredModel for GrowingLossModel {
            type Pattern = ();
            type Label = usize;

            fn dim(&self) -> usize {
                1
            }

            fn argmax(
                &self,
                _weights: &[f64],
                _example: &TrainingExample<(), usize>,
            ) -> Result<ArgmaxResult<usize>> {
                let call = self.calls.get() + 1;
                self.calls.set(call);
                Ok(ArgmaxResult {
                    label: 0,
                    loss: call as f64,
                    feature_difference: vec![1.0],
                })
            }
        }

        let model = GrowingLossModel {
            calls: Cell::new(0),
        };
        let mut solver = CoordinateQpSolver::new();
        let trainer = CuttingPlaneTrainer::new(TrainerConfig {
            max_iterations: Some(5),
            ..TrainerConfig::default()
        });
        let examples = vec![TrainingExample::new((), 0usize)];

        match trainer.train(&examples, &model, &mut solver) {
            Err(SosvmError::ConvergenceFailure {
                sweeps,
                objective,
                slack_gap,
            }) => {
                assert_eq!(sweeps, 5);
                assert!(objective > 0.0);
                assert!(slack_gap > 0.0);
            }
            other => panic!("expected ConvergenceFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_oracle_failure_carries_example_index() {
        struct BrokenModel;

        impl StructuredModel for BrokenModel {
            type Pattern = ();
            type Label = usize;

            fn dim(&self) -> usize {
                1
            }

            fn argmax(
                &self,
                _weights: &[f64],
                _example: &TrainingExample<(), usize>,
            ) -> Result<ArgmaxResult<usize>> {
                Err(SosvmError::InvalidParameter("malformed example".to_string()))
            }
        }

        let mut solver = CoordinateQpSolver::new();
        let trainer = CuttingPlaneTrainer::default();
        let examples = vec![TrainingExample::new((), 0usize)];

        match trainer.train(&examples, &BrokenModel, &mut solver) {
            Err(SosvmError::OracleFailure { example, message }) => {
                assert_eq!(example, 0);
                assert!(message.contains("malformed example"));
            }
            other => panic!("expected OracleFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_configuration_rejected_before_any_call() {
        struct PanicModel;

        impl StructuredModel for PanicModel {
            type Pattern = ();
            type Label = usize;

            fn dim(&self) -> usize {
                1
            }

            fn argmax(
                &self,
                _weights: &[f64],
                _example: &TrainingExample<(), usize>,
            ) -> Result<ArgmaxResult<usize>> {
                panic!("oracle must not be invoked");
            }
        }

        struct PanicSolver;

        impl QpSolver for PanicSolver {
            fn set_problem(&mut self, _dim: usize, _n: usize, _c: f64) -> Result<()> {
                panic!("solver must not be invoked");
            }
            fn set_bounds(&mut self, _lower: &[f64], _upper: &[f64]) -> Result<()> {
                panic!("solver must not be invoked");
            }
            fn add_constraint(&mut self, _row: &[f64], _bound: f64, _owner: usize) -> Result<()> {
                panic!("solver must not be invoked");
            }
            fn solve(&mut self) -> Result<QpSolution> {
                panic!("solver must not be invoked");
            }
        }

        let examples = vec![TrainingExample::new((), 0usize)];

        let zero_c = CuttingPlaneTrainer::new(TrainerConfig {
            c: 0.0,
            ..TrainerConfig::default()
        });
        assert!(matches!(
            zero_c.train(&examples, &PanicModel, &mut PanicSolver),
            Err(SosvmError::InvalidParameter(_))
        ));

        let bad_epsilon = CuttingPlaneTrainer::new(TrainerConfig {
            epsilon: -1.0,
            ..TrainerConfig::default()
        });
        assert!(matches!(
            bad_epsilon.train(&examples, &PanicModel, &mut PanicSolver),
            Err(SosvmError::InvalidParameter(_))
        ));

        let crossed_bounds = CuttingPlaneTrainer::new(TrainerConfig {
            lower_bounds: Some(vec![1.0]),
            upper_bounds: Some(vec![-1.0]),
            ..TrainerConfig::default()
        });
        assert!(matches!(
            crossed_bounds.train(&examples, &PanicModel, &mut PanicSolver),
            Err(SosvmError::InvalidParameter(_))
        ));

        let empty: Vec<TrainingExample<(), usize>> = Vec::new();
        assert!(matches!(
            CuttingPlaneTrainer::default().train(&empty, &PanicModel, &mut PanicSolver),
            Err(SosvmError::EmptyDataset)
        ));
    }
}
