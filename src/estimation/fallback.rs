//! Closed-form baseline used when no artifact is available.
//!
//! Formula: wait_time = crowd / (staff + 1) * minutes_per_head

use crate::estimation::model::{FeatureVector, ModelError, WaitModel};

/// Minutes of wait attributed to each person per open counter.
pub const FALLBACK_MINUTES_PER_HEAD: f64 = 4.0;

#[derive(Debug, Clone)]
pub struct FallbackFormula {
    pub minutes_per_head: f64,
}

impl FallbackFormula {
    pub fn new(minutes_per_head: f64) -> Self {
        Self { minutes_per_head }
    }

    /// Never fails: the `+ 1` keeps the divisor at least 1.
    pub fn compute(&self, features: &FeatureVector) -> f64 {
        let crowd = features.current_crowd.max(0.0);
        let staff = features.current_staff.max(0.0);
        (crowd / (staff + 1.0)) * self.minutes_per_head
    }
}

impl Default for FallbackFormula {
    fn default() -> Self {
        Self::new(FALLBACK_MINUTES_PER_HEAD)
    }
}

impl WaitModel for FallbackFormula {
    fn estimate(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(self.compute(features))
    }

    fn describe(&self) -> &str {
        "fallback_formula"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divides_crowd_across_staff_plus_one() {
        let formula = FallbackFormula::default();

        // 20 / (3 + 1) * 4 = 20.0
        assert_eq!(formula.compute(&FeatureVector::new(14, 2, 3, 20)), 20.0);
    }

    #[test]
    fn zero_staff_does_not_divide_by_zero() {
        let formula = FallbackFormula::default();

        let value = formula.compute(&FeatureVector::new(9, 0, 0, 10));

        assert_eq!(value, 40.0);
    }

    #[test]
    fn estimates_are_finite_and_non_negative_across_inputs() {
        let formula = FallbackFormula::default();

        for staff in 0..=12u32 {
            for crowd in [0u32, 1, 4, 5, 37, 100, 10_000] {
                let value = formula.compute(&FeatureVector::new(12, 3, staff, crowd));
                assert!(value.is_finite(), "staff={staff} crowd={crowd}");
                assert!(value >= 0.0, "staff={staff} crowd={crowd}");
            }
        }
    }

    #[test]
    fn empty_queue_has_no_wait() {
        let formula = FallbackFormula::default();

        assert_eq!(formula.compute(&FeatureVector::new(10, 1, 4, 0)), 0.0);
    }
}
