use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::error::ClassifierError;

#[derive(Debug, Deserialize)]
struct HeadWeights {
    weight: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

/// Affine classification head applied to the encoder's `[CLS]` representation.
///
/// Dropout sits in front of this layer during training; at inference it is the
/// identity, so the head is just `W · h + b`.
#[derive(Debug, Clone)]
pub struct LinearHead {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

impl LinearHead {
    /// Creates a head from a `[out_features, in_features]` weight matrix and an `[out_features]` bias.
    pub fn new(weight: Array2<f32>, bias: Array1<f32>) -> Result<Self, ClassifierError> {
        if weight.nrows() == 0 || weight.ncols() == 0 {
            return Err(ClassifierError::ValidationError("Head weight matrix is empty".into()));
        }
        if weight.nrows() != bias.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Head weight has {} rows but bias has {} entries",
                weight.nrows(),
                bias.len()
            )));
        }
        Ok(Self { weight, bias })
    }

    /// Parses `{"weight": [[...], ...], "bias": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let raw: HeadWeights = serde_json::from_str(json)
            .map_err(|e| ClassifierError::ArtifactError(format!("Invalid head weights: {}", e)))?;

        let rows = raw.weight.len();
        let cols = raw.weight.first().map(Vec::len).unwrap_or(0);
        if let Some(pos) = raw.weight.iter().position(|row| row.len() != cols) {
            return Err(ClassifierError::ValidationError(format!(
                "Head weight row {} has {} columns, expected {}",
                pos,
                raw.weight[pos].len(),
                cols
            )));
        }

        let flat: Vec<f32> = raw.weight.into_iter().flatten().collect();
        let weight = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| ClassifierError::ValidationError(format!("Invalid head weight shape: {}", e)))?;
        Self::new(weight, Array1::from(raw.bias))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            ClassifierError::ArtifactError(format!("Failed to read head weights {:?}: {}", path, e))
        })?;
        Self::from_json(&json)
    }

    /// Width of the representation the head expects.
    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    /// Number of logits the head produces.
    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn forward(&self, hidden: ArrayView1<f32>) -> Result<Array1<f32>, ClassifierError> {
        if hidden.len() != self.in_features() {
            return Err(ClassifierError::ModelError(format!(
                "Encoder produced {} features but the head expects {}",
                hidden.len(),
                self.in_features()
            )));
        }
        Ok(self.weight.dot(&hidden) + &self.bias)
    }
}
