//! Estimation model trait for swappable baseline wait-time strategies.
//!
//! Every baseline strategy (trained artifact or closed-form formula) implements
//! `WaitModel`. Artifact-backed models are selected via the `model` field of
//! the artifact file and loaded once at startup.

use thiserror::Error;

/// Feature names in the order every artifact must declare them.
pub const FEATURE_NAMES: [&str; 4] = [
    "hour_of_day",
    "day_of_week",
    "current_staff",
    "current_crowd",
];

/// The four numeric inputs to a baseline estimate, in artifact column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub hour_of_day: f64,
    pub day_of_week: f64,
    pub current_staff: f64,
    pub current_crowd: f64,
}

impl FeatureVector {
    pub fn new(hour: u8, day_of_week: u8, staff_count: u32, crowd_size: u32) -> Self {
        Self {
            hour_of_day: f64::from(hour),
            day_of_week: f64::from(day_of_week),
            current_staff: f64::from(staff_count),
            current_crowd: f64::from(crowd_size),
        }
    }

    /// Values ordered as `FEATURE_NAMES`.
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.hour_of_day,
            self.day_of_week,
            self.current_staff,
            self.current_crowd,
        ]
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("tree {tree}: node index {node} out of range")]
    NodeOutOfRange { tree: usize, node: i64 },
    #[error("tree {tree}: feature index {feature} out of range")]
    FeatureOutOfRange { tree: usize, feature: i64 },
    #[error("tree {tree}: traversal did not reach a leaf")]
    UnterminatedTraversal { tree: usize },
    #[error("model produced an invalid estimate: {0}")]
    InvalidOutput(f64),
}

/// A baseline wait-time strategy.
///
/// Implementations must be pure functions of their inputs once constructed so
/// that identical features always yield identical estimates.
pub trait WaitModel: Send + Sync + std::fmt::Debug {
    /// Estimate the raw wait in minutes before any context adjustment.
    fn estimate(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Short identifier used in logs and health output.
    fn describe(&self) -> &str;

    /// Artifact version, when the model was loaded from one.
    fn version(&self) -> Option<&str> {
        None
    }
}

/// Rejects estimates no downstream step can use.
pub fn ensure_valid_output(value: f64) -> Result<f64, ModelError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ModelError::InvalidOutput(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_vector_follows_artifact_column_order() {
        let features = FeatureVector::new(14, 2, 3, 20);

        assert_eq!(features.as_array(), [14.0, 2.0, 3.0, 20.0]);
    }

    #[test]
    fn invalid_outputs_are_rejected() {
        assert_eq!(ensure_valid_output(3.5), Ok(3.5));
        assert_eq!(ensure_valid_output(0.0), Ok(0.0));
        assert!(ensure_valid_output(-0.5).is_err());
        assert!(ensure_valid_output(f64::NAN).is_err());
        assert!(ensure_valid_output(f64::INFINITY).is_err());
    }
}
