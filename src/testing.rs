//! Testing utilities for datalab.
//!
//! Assertion helpers and synthetic-table generators shared by unit and
//! integration tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::Matrix;

/// Default tolerance for floating point comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Assert that two floats are approximately equal.
///
/// Uses absolute difference comparison with the given tolerance.
///
/// # Panics
///
/// Panics if the absolute difference exceeds tolerance.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left_val = $left;
        let right_val = $right;
        let tol = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                left_val, right_val, diff, tol
            );
        }
    }};
}

/// Seeded uniform `[min, max)` table.
pub fn random_matrix(rows: usize, cols: usize, seed: u64, min: f64, max: f64) -> Matrix {
    assert!(max >= min);
    let mut rng = StdRng::seed_from_u64(seed);
    let width = max - min;
    let data = (0..rows * cols)
        .map(|_| min + rng.gen::<f64>() * width)
        .collect();
    Matrix::from_vec(data, rows, cols)
}

/// Seeded uniform `[0, 1)` table as nested rows, for `set_features` inputs.
pub fn random_rows(rows: usize, cols: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.gen::<f64>()).collect())
        .collect()
}
