//! Linear regression artifact.
//!
//! Formula: wait_time = intercept + Σ coefficient[i] * feature[i]

use crate::estimation::model::{FeatureVector, ModelError, WaitModel, ensure_valid_output};
use serde::Deserialize;

/// Linear model parameters as stored in the artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearParams {
    pub intercept: f64,
    /// One coefficient per feature, in `FEATURE_NAMES` order.
    pub coefficients: Vec<f64>,
}

#[derive(Debug)]
pub struct LinearModel {
    params: LinearParams,
    version: String,
}

impl LinearModel {
    pub fn new(params: LinearParams, version: String) -> Result<Self, String> {
        if params.coefficients.len() != 4 {
            return Err(format!(
                "linear model expects 4 coefficients, got {}",
                params.coefficients.len()
            ));
        }
        if !params.intercept.is_finite() || params.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("linear model parameters must be finite".to_string());
        }
        Ok(Self { params, version })
    }
}

impl WaitModel for LinearModel {
    fn estimate(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let value = features
            .as_array()
            .iter()
            .zip(&self.params.coefficients)
            .fold(self.params.intercept, |acc, (x, w)| acc + x * w);
        ensure_valid_output(value)
    }

    fn version(&self) -> Option<&str> {
        Some(&self.version)
    }

    fn describe(&self) -> &str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(intercept: f64, coefficients: Vec<f64>) -> LinearModel {
        LinearModel::new(
            LinearParams {
                intercept,
                coefficients,
            },
            "test".to_string(),
        )
        .expect("valid linear params")
    }

    #[test]
    fn applies_weights_in_feature_order() {
        let model = model(2.0, vec![0.0, 0.0, -1.0, 1.5]);

        // 2.0 - 3.0 + 1.5 * 20 = 29.0
        let value = model.estimate(&FeatureVector::new(14, 2, 3, 20));

        assert_eq!(value, Ok(29.0));
    }

    #[test]
    fn negative_estimate_is_an_error() {
        let model = model(-50.0, vec![0.0, 0.0, 0.0, 1.0]);

        let value = model.estimate(&FeatureVector::new(14, 2, 3, 1));

        assert_eq!(value, Err(ModelError::InvalidOutput(-49.0)));
    }

    #[test]
    fn wrong_coefficient_count_is_rejected() {
        let result = LinearModel::new(
            LinearParams {
                intercept: 0.0,
                coefficients: vec![1.0, 2.0],
            },
            "test".to_string(),
        );

        assert!(result.is_err());
    }
}
