//! Linear multiclass model
//!
//! Treats multiclass classification as the simplest structured problem:
//! the joint feature map places the input vector into the weight block of
//! the candidate class, and the task loss is 0/1. One weight vector of
//! length `n_features * n_classes` thus holds one linear machine per
//! class.

use crate::core::{ArgmaxResult, Result, SosvmError, StructuredModel, TrainingExample};

/// Multiclass model with block feature map and 0/1 loss
#[derive(Debug, Clone)]
pub struct MulticlassModel {
    n_features: usize,
    n_classes: usize,
}

impl MulticlassModel {
    /// Create a model for `n_classes` classes over `n_features`-dimensional
    /// patterns
    pub fn new(n_features: usize, n_classes: usize) -> Self {
        Self {
            n_features,
            n_classes,
        }
    }

    /// Number of pattern features
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of classes
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Score of one class: dot product of the pattern with that class's
    /// weight block
    fn class_score(&self, weights: &[f64], pattern: &[f64], class: usize) -> f64 {
        let block = &weights[class * self.n_features..(class + 1) * self.n_features];
        block
            .iter()
            .zip(pattern.iter())
            .map(|(&w, &x)| w * x)
            .sum()
    }

    /// Joint feature map difference `Psi(x, truth) - Psi(x, predicted)`
    fn feature_difference(&self, pattern: &[f64], truth: usize, predicted: usize) -> Vec<f64> {
        let mut difference = vec![0.0; self.dim()];
        if truth != predicted {
            for (k, &x) in pattern.iter().enumerate() {
                difference[truth * self.n_features + k] = x;
                difference[predicted * self.n_features + k] = -x;
            }
        }
        difference
    }

    /// Predict the class of a pattern under the given weights (no loss
    /// augmentation; ties break toward the lowest class index)
    pub fn predict(&self, weights: &[f64], pattern: &[f64]) -> usize {
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for class in 0..self.n_classes {
            let score = self.class_score(weights, pattern, class);
            if score > best_score {
                best_score = score;
                best = class;
            }
        }
        best
    }
}

impl StructuredModel for MulticlassModel {
    type Pattern = Vec<f64>;
    type Label = usize;

    fn dim(&self) -> usize {
        self.n_features * self.n_classes
    }

    fn argmax(
        &self,
        weights: &[f64],
        example: &TrainingExample<Vec<f64>, usize>,
    ) -> Result<ArgmaxResult<usize>> {
        if example.pattern.len() != self.n_features {
            return Err(SosvmError::DimensionMismatch {
                expected: self.n_features,
                actual: example.pattern.len(),
            });
        }
        if example.label >= self.n_classes {
            return Err(SosvmError::InvalidParameter(format!(
                "label {} out of range for {} classes",
                example.label, self.n_classes
            )));
        }

        let truth = example.label;
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for class in 0..self.n_classes {
            let loss = if class == truth { 0.0 } else { 1.0 };
            let score = self.class_score(weights, &example.pattern, class) + loss;
            if score > best_score {
                best_score = score;
                best = class;
            }
        }

        let loss = if best == truth { 0.0 } else { 1.0 };
        Ok(ArgmaxResult {
            label: best,
            loss,
            feature_difference: self.feature_difference(&example.pattern, truth, best),
        })
    }
}
