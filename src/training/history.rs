//! Per-epoch fitting history.

use serde::{Deserialize, Serialize};

/// Time series of training and validation loss/accuracy, one entry per epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FitHistory {
    /// Training loss per epoch.
    pub train_loss: Vec<f64>,
    /// Validation loss per epoch.
    pub val_loss: Vec<f64>,
    /// Training accuracy per epoch.
    pub train_accuracy: Vec<f64>,
    /// Validation accuracy per epoch.
    pub val_accuracy: Vec<f64>,
}

impl FitHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one epoch's measurements.
    pub fn push_epoch(
        &mut self,
        train_loss: f64,
        val_loss: f64,
        train_accuracy: f64,
        val_accuracy: f64,
    ) {
        self.train_loss.push(train_loss);
        self.val_loss.push(val_loss);
        self.train_accuracy.push(train_accuracy);
        self.val_accuracy.push(val_accuracy);
    }

    /// Number of recorded epochs.
    pub fn len(&self) -> usize {
        self.train_loss.len()
    }

    /// Returns true if no epochs were recorded.
    pub fn is_empty(&self) -> bool {
        self.train_loss.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_stay_aligned() {
        let mut h = FitHistory::new();
        h.push_epoch(0.7, 0.8, 0.5, 0.45);
        h.push_epoch(0.5, 0.6, 0.7, 0.65);
        assert_eq!(h.len(), 2);
        assert_eq!(h.val_loss, vec![0.8, 0.6]);
        assert_eq!(h.train_accuracy, vec![0.5, 0.7]);
    }

    #[test]
    fn serializes_to_json() {
        let mut h = FitHistory::new();
        h.push_epoch(0.7, 0.8, 0.5, 0.45);
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.contains("val_accuracy"));
    }
}
