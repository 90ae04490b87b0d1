//! Model fitting for the experimentation harness.
//!
//! The trainer consumes a [`crate::data::Dataset`] with non-empty train/test
//! partitions and produces a per-epoch [`FitHistory`]. The network has two
//! hidden ReLU layers sized from the feature count, dropout after the first,
//! and a sigmoid output head trained with binary cross-entropy under RMSprop.

mod history;
mod metric;
mod model;
mod trainer;

pub use history::FitHistory;
pub use metric::{Accuracy, LogLoss, Metric};
pub use model::Mlp;
pub use trainer::{FitParams, TrainError, Trainer};
