//! datalab: a small experimentation harness for toy binary classification.
//!
//! The crate builds synthetic feature tables, injects a deterministic target
//! label and controlled corruption (missing cells, noise features), optionally
//! repairs the corruption, fits a small feed-forward network, and renders
//! accuracy/loss curves.
//!
//! The center of the crate is the [`data::Dataset`] pipeline: a fluent builder
//! composed with the strategy variant sets in [`target`], [`damage`] and
//! [`fix`], persisted as single-file `.dlab` snapshots via [`io`].

pub mod damage;
pub mod data;
pub mod fix;
pub mod io;
pub mod plot;
pub mod target;
pub mod testing;
pub mod training;

pub use damage::Damage;
pub use data::{DataError, Dataset, Matrix};
pub use fix::Fix;
pub use target::TargetFn;
pub use training::{FitHistory, FitParams, TrainError, Trainer};
