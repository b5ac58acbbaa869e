//! Per-scale standardizer + logistic-regression models and where they come
//! from.

use super::scale::LengthScales;
use crate::PlasClassError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Componentwise `(x - mean) / scale`. A zero `scale` entry marks a
/// constant feature and divides by 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Standardizer {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    pub fn identity(dimension: usize) -> Self {
        Self {
            mean: vec![0.0; dimension],
            scale: vec![1.0; dimension],
        }
    }

    pub fn transform_in_place(&self, row: &mut [f64]) {
        for ((x, m), &s) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
            let s = if s == 0.0 { 1.0 } else { s };
            *x = (*x - m) / s;
        }
    }
}

/// Binary logistic regression over standardized features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearClassifier {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    /// Log-odds of the plasmid class.
    pub fn decision_function(&self, row: &[f64]) -> f64 {
        row.iter()
            .zip(&self.weights)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.bias
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        logistic(self.decision_function(row))
    }
}

/// Numerically stable logistic function.
pub fn logistic(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Standardizer and classifier trained for one length scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleModel {
    pub standardizer: Standardizer,
    pub classifier: LinearClassifier,
}

impl ScaleModel {
    pub fn new(standardizer: Standardizer, classifier: LinearClassifier) -> Self {
        Self {
            standardizer,
            classifier,
        }
    }

    /// Check every vector against the feature dimension.
    pub fn validate(&self, scale: u64, dimension: usize) -> Result<(), PlasClassError> {
        let parts = [
            ("standardizer mean", self.standardizer.mean.len()),
            ("standardizer scale", self.standardizer.scale.len()),
            ("classifier weight", self.classifier.weights.len()),
        ];
        for (part, found) in parts {
            if found != dimension {
                return Err(PlasClassError::ModelShape {
                    scale,
                    part,
                    expected: dimension,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Standardize `row` in place and return the plasmid probability.
    pub fn score_in_place(&self, row: &mut [f64]) -> f64 {
        self.standardizer.transform_in_place(row);
        self.classifier.predict_proba(row)
    }

    /// Score every row of a row-major feature matrix in order.
    pub fn predict_matrix(&self, matrix: &mut [f64], dimension: usize) -> Vec<f64> {
        matrix
            .chunks_mut(dimension)
            .map(|row| self.score_in_place(row))
            .collect()
    }
}

/// Anything that can hand out the model for a length scale.
pub trait ModelSource {
    fn load(&self, scale: u64) -> Result<ScaleModel, PlasClassError>;
}

impl ModelSource for HashMap<u64, ScaleModel> {
    fn load(&self, scale: u64) -> Result<ScaleModel, PlasClassError> {
        self.get(&scale)
            .cloned()
            .ok_or(PlasClassError::MissingModel { scale })
    }
}

/// Directory holding one `scale_<L>.json` file per length scale.
#[derive(Debug, Clone)]
pub struct ModelDirectory {
    root: PathBuf,
}

impl ModelDirectory {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn model_path(&self, scale: u64) -> PathBuf {
        self.root.join(format!("scale_{}.json", scale))
    }

    /// Write `model` for `scale`, creating the directory if needed.
    pub fn save(&self, scale: u64, model: &ScaleModel) -> Result<(), PlasClassError> {
        std::fs::create_dir_all(&self.root)?;
        let contents = serde_json::to_string(model)?;
        std::fs::write(self.model_path(scale), contents)?;
        Ok(())
    }
}

impl ModelSource for ModelDirectory {
    fn load(&self, scale: u64) -> Result<ScaleModel, PlasClassError> {
        let path = self.model_path(scale);
        if !path.exists() {
            return Err(PlasClassError::MissingModel { scale });
        }
        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents).map_err(|e| {
            PlasClassError::Serialization(format!("{}: {}", path.display(), e))
        })
    }
}

/// One validated model per configured length scale, indexed like
/// [`LengthScales`].
#[derive(Debug, Clone)]
pub struct ModelSet {
    models: Vec<ScaleModel>,
}

impl ModelSet {
    /// Load and validate a model for every scale. Any missing or misshapen
    /// model fails the whole set.
    pub fn load(
        scales: &LengthScales,
        source: &dyn ModelSource,
        dimension: usize,
    ) -> Result<Self, PlasClassError> {
        let mut models = Vec::with_capacity(scales.len());
        for &scale in scales.as_slice() {
            tracing::info!("Loading classifier for length scale {}", scale);
            let model = source.load(scale)?;
            model.validate(scale, dimension)?;
            models.push(model);
        }
        Ok(Self { models })
    }

    /// Model at the position returned by [`LengthScales::select_index`].
    pub fn get(&self, index: usize) -> Option<&ScaleModel> {
        self.models.get(index)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
