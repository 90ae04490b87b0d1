//! Deterministic target generators: feature row → class label.

use crate::data::DataError;

/// Closed set of target generators.
///
/// Every variant is a pure function of the feature row; identical rows always
/// yield identical labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFn {
    /// Threshold the per-feature sine wave and compare the hit count against
    /// `sin(0.5) * feature_count`.
    Alpha,
}

impl TargetFn {
    /// Compute the label for one feature row.
    ///
    /// Fails with [`DataError::EmptyFeatureRow`] on an empty row.
    pub fn label(&self, row: &[f64]) -> Result<f64, DataError> {
        if row.is_empty() {
            return Err(DataError::EmptyFeatureRow);
        }
        match self {
            TargetFn::Alpha => {
                let tops: f64 = row
                    .iter()
                    .map(|&f| if f.sin() > 0.5 { 1.0 } else { 0.0 })
                    .sum();
                let threshold = 0.5_f64.sin() * row.len() as f64;
                Ok(if tops > threshold { 1.0 } else { 0.0 })
            }
        }
    }

    /// Human-readable formula (informational only).
    pub fn formula(&self) -> &'static str {
        match self {
            TargetFn::Alpha => r"$t=((\sum_{i}{(\sin{f_i}>0.5)\times1.0})>\mu_f)\times1.0$",
        }
    }

    /// Variant name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            TargetFn::Alpha => "alpha",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_binary_and_deterministic() {
        let row = [1.0, 2.0, 3.0];
        let label = TargetFn::Alpha.label(&row).unwrap();
        assert!(label == 0.0 || label == 1.0);
        for _ in 0..10 {
            assert_eq!(TargetFn::Alpha.label(&row).unwrap(), label);
        }
    }

    #[test]
    fn alpha_rejects_empty_row() {
        assert!(matches!(
            TargetFn::Alpha.label(&[]).unwrap_err(),
            DataError::EmptyFeatureRow
        ));
    }

    #[test]
    fn alpha_threshold_semantics() {
        // sin(1.0) ≈ 0.841 > 0.5, so every feature counts as a top: the sum
        // (= n) always exceeds sin(0.5) * n ≈ 0.479 n.
        assert_eq!(TargetFn::Alpha.label(&[1.0, 1.0, 1.0]).unwrap(), 1.0);
        // sin(0.1) ≈ 0.0998 < 0.5: no tops, sum 0 never exceeds the threshold.
        assert_eq!(TargetFn::Alpha.label(&[0.1, 0.1, 0.1]).unwrap(), 0.0);
    }

    #[test]
    fn alpha_exposes_formula() {
        assert!(TargetFn::Alpha.formula().contains(r"\sin"));
    }
}
