//! Linear regression artifact
//!
//! JSON export of a fitted linear model:
//!
//! ```json
//! { "intercept": 2.94, "coefficients": [0.0458, 0.1885, -0.001], "feature_names": ["TV", "Radio", "Newspaper"] }
//! ```

use serde::{Deserialize, Serialize};

use super::inference::{ModelError, Regressor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    /// Column names seen at training time, if the exporter kept them
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LinearModel {
    #[cfg(test)]
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
            feature_names: None,
        }
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let model: LinearModel = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::Load(format!("Invalid linear model: {}", e)))?;

        if model.coefficients.is_empty() {
            return Err(ModelError::Load("Linear model has no coefficients".to_string()));
        }
        if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Load("Linear model has non-finite weights".to_string()));
        }
        if let Some(names) = &model.feature_names {
            if names.len() != model.coefficients.len() {
                return Err(ModelError::Load(format!(
                    "Linear model lists {} feature names for {} coefficients",
                    names.len(),
                    model.coefficients.len()
                )));
            }
        }

        Ok(model)
    }
}

impl Regressor for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(c, x)| c * x)
            .sum();

        Ok(self.intercept + dot)
    }

    fn feature_count(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn feature_names(&self) -> Option<Vec<String>> {
        self.feature_names.clone()
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}
