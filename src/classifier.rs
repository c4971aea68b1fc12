// src/classifier.rs - Gesture classifier seam and the linear model artifact
use crate::gesture::Gesture;
use crate::landmarks::{FeatureVector, FEATURE_LEN};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Per-frame classifier output.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: Gesture,
    pub confidence: f64,
    pub distribution: Vec<(Gesture, f64)>,
}

impl Classification {
    /// Picks the most probable label. `None` for an empty distribution.
    pub fn from_distribution(distribution: Vec<(Gesture, f64)>) -> Option<Self> {
        let (label, confidence) = distribution
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        Some(Self {
            label,
            confidence,
            distribution,
        })
    }

    /// Shortcut for a distribution concentrated on one label.
    pub fn certain(label: Gesture, confidence: f64) -> Self {
        Self {
            label,
            confidence,
            distribution: vec![(label, confidence)],
        }
    }

    pub fn confidence_percent(&self) -> u8 {
        (self.confidence.clamp(0.0, 1.0) * 100.0) as u8
    }
}

/// Stateless mapping from wrist-relative features to a gesture.
pub trait GestureClassifier {
    fn labels(&self) -> &[Gesture];
    fn classify(&self, features: &FeatureVector) -> Classification;
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse model file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model has no labels")]
    Empty,
    #[error("model has {labels} labels but {weights} weight rows and {intercepts} intercepts")]
    LengthMismatch {
        labels: usize,
        weights: usize,
        intercepts: usize,
    },
    #[error("weights for {label} have {actual} entries, expected 42")]
    FeatureWidth { label: Gesture, actual: usize },
    #[error("label {0} appears more than once")]
    DuplicateLabel(Gesture),
    #[error("model contains non-finite coefficients")]
    NonFinite,
}

/// On-disk layout of a one-vs-rest linear model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub labels: Vec<Gesture>,
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

/// Linear decision functions `w·x + b` per label, softmaxed into probabilities.
#[derive(Debug, Clone)]
pub struct LinearModel {
    labels: Vec<Gesture>,
    weights: DMatrix<f64>,
    intercepts: DVector<f64>,
}

impl LinearModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact =
            serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let model = Self::from_artifact(artifact)?;
        info!(
            labels = model.labels.len(),
            features = FEATURE_LEN,
            "loaded gesture model from {}",
            path.display()
        );
        Ok(model)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let ModelArtifact {
            labels,
            weights,
            intercepts,
        } = artifact;

        if labels.is_empty() {
            return Err(ModelError::Empty);
        }
        if weights.len() != labels.len() || intercepts.len() != labels.len() {
            return Err(ModelError::LengthMismatch {
                labels: labels.len(),
                weights: weights.len(),
                intercepts: intercepts.len(),
            });
        }

        let mut seen = HashSet::new();
        for (label, row) in labels.iter().zip(&weights) {
            if !seen.insert(*label) {
                return Err(ModelError::DuplicateLabel(*label));
            }
            if row.len() != FEATURE_LEN {
                return Err(ModelError::FeatureWidth {
                    label: *label,
                    actual: row.len(),
                });
            }
        }

        let all_finite = weights.iter().flatten().chain(&intercepts).all(|v| v.is_finite());
        if !all_finite {
            return Err(ModelError::NonFinite);
        }

        let weights = DMatrix::from_row_iterator(
            labels.len(),
            FEATURE_LEN,
            weights.into_iter().flatten(),
        );

        Ok(Self {
            labels,
            weights,
            intercepts: DVector::from_vec(intercepts),
        })
    }

    pub fn to_artifact(&self) -> ModelArtifact {
        ModelArtifact {
            labels: self.labels.clone(),
            weights: self
                .weights
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
            intercepts: self.intercepts.iter().copied().collect(),
        }
    }

    fn decision_values(&self, features: &FeatureVector) -> DVector<f64> {
        let x = DVector::from_column_slice(features.as_slice());
        &self.weights * x + &self.intercepts
    }
}

impl GestureClassifier for LinearModel {
    fn labels(&self) -> &[Gesture] {
        &self.labels
    }

    fn classify(&self, features: &FeatureVector) -> Classification {
        let scores = self.decision_values(features);
        let max = scores.max();
        let exp = scores.map(|s| (s - max).exp());
        let total = exp.sum();

        let distribution: Vec<(Gesture, f64)> = self
            .labels
            .iter()
            .zip(exp.iter())
            .map(|(label, e)| (*label, e / total))
            .collect();

        // labels are non-empty by construction
        Classification::from_distribution(distribution)
            .unwrap_or_else(|| Classification::certain(Gesture::NoHand, 0.0))
    }
}
