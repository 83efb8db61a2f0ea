//! Model serialization and persistence
//!
//! Saves trained multiclass models as JSON for the CLI and other
//! scenarios where a trained weight vector must outlive the process.

use crate::api::TrainedSoSvm;
use crate::core::{Result, SosvmError};
use crate::model::MulticlassModel;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable representation of a trained multiclass model
#[derive(Serialize, Deserialize)]
pub struct SerializableModel {
    /// Trained weight vector (n_features * n_classes)
    pub weights: Vec<f64>,
    /// Number of pattern features
    pub n_features: usize,
    /// Number of classes
    pub n_classes: usize,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Training parameters used
    pub training_params: TrainingParams,
    /// Final primal objective
    pub objective: f64,
    /// Constraints retained in the working set
    pub n_constraints: usize,
    /// Sweeps the trainer ran
    pub sweeps: usize,
    /// Creation timestamp
    pub created_at: String,
}

/// Training parameters for reference
#[derive(Serialize, Deserialize)]
pub struct TrainingParams {
    pub c: f64,
    pub epsilon: f64,
    pub max_iterations: Option<usize>,
}

impl SerializableModel {
    /// Create a serializable model from a trained model
    pub fn from_trained(trained: &TrainedSoSvm<MulticlassModel>) -> Self {
        let config = trained.config();
        Self {
            weights: trained.weights().to_vec(),
            n_features: trained.model().n_features(),
            n_classes: trained.model().n_classes(),
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                training_params: TrainingParams {
                    c: config.c,
                    epsilon: config.epsilon,
                    max_iterations: config.max_iterations,
                },
                objective: trained.objective(),
                n_constraints: trained.n_constraints(),
                sweeps: trained.sweeps(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// Save model to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SosvmError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SosvmError::ParseError(format!("Failed to serialize model: {e}")))
    }

    /// Load model from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SosvmError::IoError)?;
        let reader = BufReader::new(file);
        let model: SerializableModel = serde_json::from_reader(reader)
            .map_err(|e| SosvmError::ParseError(format!("Failed to deserialize model: {e}")))?;

        if model.weights.len() != model.n_features * model.n_classes {
            return Err(SosvmError::DimensionMismatch {
                expected: model.n_features * model.n_classes,
                actual: model.weights.len(),
            });
        }
        Ok(model)
    }

    /// Reconstruct the model and its weight vector
    pub fn into_model(self) -> (MulticlassModel, Vec<f64>) {
        (
            MulticlassModel::new(self.n_features, self.n_classes),
            self.weights,
        )
    }
}
