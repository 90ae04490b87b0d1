//! Feature tables and the dataset pipeline aggregate.

mod dataset;
mod matrix;

pub use dataset::{DataError, Dataset};
pub use matrix::Matrix;
