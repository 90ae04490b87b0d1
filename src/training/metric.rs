//! Evaluation metrics for model quality.
//!
//! Metrics are separate from the training loss — the model is optimized with
//! binary cross-entropy but monitored with whatever metrics the caller picks.

/// A metric for evaluating model quality.
pub trait Metric: Send + Sync {
    /// Compute the metric over predicted probabilities and ground-truth
    /// labels.
    fn compute(&self, preds: &[f64], labels: &[f64]) -> f64;

    /// Whether higher values indicate better performance.
    fn higher_is_better(&self) -> bool;

    /// Name of the metric (for logging).
    fn name(&self) -> &'static str;
}

/// Binary classification accuracy with a 0.5 decision threshold.
///
/// Higher is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accuracy;

impl Metric for Accuracy {
    fn compute(&self, preds: &[f64], labels: &[f64]) -> f64 {
        debug_assert_eq!(preds.len(), labels.len());
        if preds.is_empty() {
            return 0.0;
        }
        let correct = preds
            .iter()
            .zip(labels)
            .filter(|(p, l)| (**p > 0.5) == (**l > 0.5))
            .count();
        correct as f64 / preds.len() as f64
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "accuracy"
    }
}

/// Binary cross-entropy: `-mean(y·ln(p) + (1-y)·ln(1-p))`.
///
/// Lower is better. Probabilities are clamped away from 0 and 1 so the loss
/// stays finite.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLoss;

/// Clamp bound keeping `ln` finite.
pub(crate) const PROB_EPSILON: f64 = 1e-12;

impl Metric for LogLoss {
    fn compute(&self, preds: &[f64], labels: &[f64]) -> f64 {
        debug_assert_eq!(preds.len(), labels.len());
        if preds.is_empty() {
            return 0.0;
        }
        let total: f64 = preds
            .iter()
            .zip(labels)
            .map(|(&p, &y)| {
                let p = p.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
                -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            })
            .sum();
        total / preds.len() as f64
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "logloss"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn accuracy_counts_threshold_matches() {
        let preds = [0.9, 0.2, 0.6, 0.4];
        let labels = [1.0, 0.0, 0.0, 0.0];
        assert_approx_eq!(Accuracy.compute(&preds, &labels), 0.75, 1e-12);
        assert!(Accuracy.higher_is_better());
    }

    #[test]
    fn logloss_perfect_predictions_near_zero() {
        let preds = [1.0, 0.0];
        let labels = [1.0, 0.0];
        assert!(LogLoss.compute(&preds, &labels) < 1e-10);
        assert!(!LogLoss.higher_is_better());
    }

    #[test]
    fn logloss_is_finite_at_extremes() {
        let v = LogLoss.compute(&[0.0, 1.0], &[1.0, 0.0]);
        assert!(v.is_finite());
        assert!(v > 1.0);
    }

    #[test]
    fn empty_inputs_yield_zero() {
        assert_eq!(Accuracy.compute(&[], &[]), 0.0);
        assert_eq!(LogLoss.compute(&[], &[]), 0.0);
    }
}
