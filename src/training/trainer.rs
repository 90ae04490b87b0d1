//! The fitting loop: dataset partitions in, per-epoch history out.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::data::{Dataset, Matrix};

use super::history::FitHistory;
use super::metric::{Accuracy, LogLoss, Metric};
use super::model::{Mlp, RmsProp};

/// Fitting parameters.
#[derive(Debug, Clone, Copy)]
pub struct FitParams {
    /// Minibatch size.
    pub batch_size: usize,
    /// Number of passes over the training partition.
    pub epochs: usize,
    /// RMSprop learning rate.
    pub learning_rate: f64,
    /// Fixed seed for weight init, shuffling and dropout; entropy if `None`.
    pub seed: Option<u64>,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            batch_size: 512,
            epochs: 500,
            learning_rate: 1e-3,
            seed: None,
        }
    }
}

/// Errors surfaced by [`Trainer::fit`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum TrainError {
    /// The dataset has not been split into train/test partitions.
    #[error("dataset has no train/test partitions; run split() before fitting")]
    MissingPartitions,

    /// Train and test partitions disagree on the feature count.
    #[error("partition feature counts differ: train has {train}, test has {test}")]
    FeatureCountMismatch { train: usize, test: usize },

    /// The feature table still contains missing cells.
    #[error("features contain {missing} missing cells; run fix() before fitting")]
    MissingCells { missing: usize },

    /// Batch size and epoch counts must be positive.
    #[error("{name} must be positive")]
    ZeroParam { name: &'static str },
}

/// Fits the feed-forward model to a split dataset.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    params: FitParams,
}

impl Trainer {
    /// Trainer with the given parameters.
    pub fn new(params: FitParams) -> Self {
        Self { params }
    }

    /// Fit the model and record per-epoch train/validation loss and accuracy.
    ///
    /// Requires all four partitions; the test partition doubles as the
    /// validation set.
    pub fn fit(&self, data: &Dataset) -> Result<FitHistory, TrainError> {
        let (train_x, train_y, test_x, test_y) = partitions(data)?;
        if self.params.batch_size == 0 {
            return Err(TrainError::ZeroParam { name: "batch_size" });
        }
        if self.params.epochs == 0 {
            return Err(TrainError::ZeroParam { name: "epochs" });
        }

        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut model = Mlp::new(train_x.num_cols(), &mut rng);
        let opt = RmsProp {
            learning_rate: self.params.learning_rate,
            ..RmsProp::default()
        };

        info!(
            train_rows = train_x.num_rows(),
            test_rows = test_x.num_rows(),
            features = train_x.num_cols(),
            batch_size = self.params.batch_size,
            epochs = self.params.epochs,
            "fitting model"
        );

        let mut order: Vec<usize> = (0..train_x.num_rows()).collect();
        let mut history = FitHistory::new();

        for epoch in 0..self.params.epochs {
            order.shuffle(&mut rng);
            for batch in order.chunks(self.params.batch_size) {
                model.train_batch(train_x, batch, train_y, &opt, &mut rng);
            }

            let train_preds = model.predict(train_x);
            let test_preds = model.predict(test_x);
            let train_loss = LogLoss.compute(&train_preds, train_y);
            let val_loss = LogLoss.compute(&test_preds, test_y);
            let train_acc = Accuracy.compute(&train_preds, train_y);
            let val_acc = Accuracy.compute(&test_preds, test_y);
            history.push_epoch(train_loss, val_loss, train_acc, val_acc);

            debug!(epoch, train_loss, val_loss, train_acc, val_acc, "epoch done");
            if (epoch + 1) % 50 == 0 || epoch + 1 == self.params.epochs {
                info!(
                    epoch = epoch + 1,
                    train_loss, val_loss, train_acc, val_acc, "progress"
                );
            }
        }

        Ok(history)
    }
}

/// Validate and borrow the four partitions.
fn partitions(data: &Dataset) -> Result<(&Matrix, &[f64], &Matrix, &[f64]), TrainError> {
    let (train_x, train_y, test_x, test_y) = match (
        data.train_features(),
        data.train_labels(),
        data.test_features(),
        data.test_labels(),
    ) {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => return Err(TrainError::MissingPartitions),
    };

    if train_x.num_cols() != test_x.num_cols() {
        return Err(TrainError::FeatureCountMismatch {
            train: train_x.num_cols(),
            test: test_x.num_cols(),
        });
    }
    let missing = train_x.num_missing() + test_x.num_missing();
    if missing > 0 {
        return Err(TrainError::MissingCells { missing });
    }
    Ok((train_x, train_y, test_x, test_y))
}
