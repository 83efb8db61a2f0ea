//! Multiclass LibSVM-format dataset loader
//!
//! Parses the usual `label index:value ...` lines, with class labels as
//! non-negative integers and 1-based feature indices. Patterns are
//! densified to the largest feature index seen in the file.

use crate::core::{Result, SosvmError, TrainingExample};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Multiclass dataset backed by dense patterns
#[derive(Debug, Clone)]
pub struct MulticlassDataset {
    examples: Vec<TrainingExample<Vec<f64>, usize>>,
    n_features: usize,
    n_classes: usize,
}

impl MulticlassDataset {
    /// Load from a LibSVM-format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut sparse_rows: Vec<(usize, Vec<(usize, f64)>)> = Vec::new();
        let mut n_features = 0;
        let mut n_classes = 0;

        for (line_no, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let label_token = parts.next().ok_or_else(|| {
                SosvmError::ParseError(format!("line {}: missing label", line_no + 1))
            })?;
            let label: usize = label_token.parse().map_err(|_| {
                SosvmError::ParseError(format!(
                    "line {}: invalid class label '{label_token}'",
                    line_no + 1
                ))
            })?;
            let label_span = label.checked_add(1).ok_or_else(|| {
                SosvmError::ParseError(format!(
                    "line {}: class label {label} out of range",
                    line_no + 1
                ))
            })?;
            n_classes = n_classes.max(label_span);

            let mut features = Vec::new();
            for token in parts {
                let (index_str, value_str) = token.split_once(':').ok_or_else(|| {
                    SosvmError::ParseError(format!(
                        "line {}: expected index:value, got '{token}'",
                        line_no + 1
                    ))
                })?;
                let index: usize = index_str.parse().map_err(|_| {
                    SosvmError::ParseError(format!(
                        "line {}: invalid feature index '{index_str}'",
                        line_no + 1
                    ))
                })?;
                if index == 0 {
                    return Err(SosvmError::ParseError(format!(
                        "line {}: feature indices are 1-based",
                        line_no + 1
                    )));
                }
                let value: f64 = value_str.parse().map_err(|_| {
                    SosvmError::ParseError(format!(
                        "line {}: invalid feature value '{value_str}'",
                        line_no + 1
                    ))
                })?;
                n_features = n_features.max(index);
                features.push((index - 1, value));
            }

            sparse_rows.push((label, features));
        }

        if sparse_rows.is_empty() {
            return Err(SosvmError::EmptyDataset);
        }

        let examples = sparse_rows
            .into_iter()
            .map(|(label, features)| {
                let mut pattern = vec![0.0; n_features];
                for (index, value) in features {
                    pattern[index] = value;
                }
                TrainingExample::new(pattern, label)
            })
            .collect();

        Ok(Self {
            examples,
            n_features,
            n_classes,
        })
    }

    /// The training examples
    pub fn examples(&self) -> &[TrainingExample<Vec<f64>, usize>] {
        &self.examples
    }

    /// Number of features (largest index in the file)
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of classes (largest label + 1)
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Number of examples
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Check whether the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}
