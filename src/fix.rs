//! Fixers: repair of missing cells in a feature table.

use tracing::warn;

use crate::data::Matrix;

/// Closed set of repair transformations.
///
/// Every variant replaces all missing (NaN) cells, keeps the shape, and
/// leaves originally non-missing cells untouched. Applying a fix to an
/// already-fixed table is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fix {
    /// Replace every missing cell with `0.0`.
    Zero,

    /// Replace every missing cell with the mean of its own column over the
    /// non-missing values. A fully missing column falls back to `0.0`.
    ColumnMean,
}

impl Fix {
    /// Repair all missing cells.
    pub fn apply(&self, mut matrix: Matrix) -> Matrix {
        match self {
            Fix::Zero => {
                for v in matrix.as_mut_slice() {
                    if v.is_nan() {
                        *v = 0.0;
                    }
                }
                matrix
            }
            Fix::ColumnMean => {
                let means = column_means(&matrix);
                let cols = matrix.num_cols();
                for (i, v) in matrix.as_mut_slice().iter_mut().enumerate() {
                    if v.is_nan() {
                        *v = means[i % cols];
                    }
                }
                matrix
            }
        }
    }

    /// Variant name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Fix::Zero => "zero",
            Fix::ColumnMean => "column_mean",
        }
    }
}

/// Per-column mean over non-missing values; `0.0` for fully missing columns.
fn column_means(matrix: &Matrix) -> Vec<f64> {
    let cols = matrix.num_cols();
    let mut sums = vec![0.0f64; cols];
    let mut counts = vec![0usize; cols];
    for row in matrix.rows() {
        for (c, &v) in row.iter().enumerate() {
            if !v.is_nan() {
                sums[c] += v;
                counts[c] += 1;
            }
        }
    }
    sums.iter()
        .zip(&counts)
        .enumerate()
        .map(|(c, (&sum, &count))| {
            if count == 0 {
                warn!(column = c, "column is fully missing; filling with 0.0");
                0.0
            } else {
                sum / count as f64
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_holes() -> Matrix {
        // Column 0: 1, NaN, 7 -> mean 4. Column 1: NaN, 4, 8 -> mean 6.
        Matrix::from_vec(vec![1.0, f64::NAN, f64::NAN, 4.0, 7.0, 8.0], 3, 2)
    }

    #[test]
    fn zero_fill_clears_all_missing() {
        let fixed = Fix::Zero.apply(with_holes());
        assert_eq!(fixed.num_missing(), 0);
        assert_eq!(fixed.get(1, 0), 0.0);
        assert_eq!(fixed.get(0, 1), 0.0);
        // Non-missing cells untouched.
        assert_eq!(fixed.get(0, 0), 1.0);
        assert_eq!(fixed.get(2, 1), 8.0);
    }

    #[test]
    fn mean_fill_uses_column_means() {
        let fixed = Fix::ColumnMean.apply(with_holes());
        assert_eq!(fixed.num_missing(), 0);
        assert_eq!(fixed.get(1, 0), 4.0);
        assert_eq!(fixed.get(0, 1), 6.0);
        assert_eq!(fixed.get(2, 0), 7.0);
    }

    #[test]
    fn mean_fill_fully_missing_column_falls_back_to_zero() {
        let m = Matrix::from_vec(vec![f64::NAN, 2.0, f64::NAN, 4.0], 2, 2);
        let fixed = Fix::ColumnMean.apply(m);
        assert_eq!(fixed.num_missing(), 0);
        assert_eq!(fixed.get(0, 0), 0.0);
        assert_eq!(fixed.get(1, 0), 0.0);
        assert_eq!(fixed.get(0, 1), 2.0);
    }

    #[test]
    fn fixes_are_idempotent_once_clean() {
        let fixed = Fix::ColumnMean.apply(with_holes());
        let again = Fix::ColumnMean.apply(fixed.clone());
        assert_eq!(again.as_slice(), fixed.as_slice());
        let zeroed = Fix::Zero.apply(fixed.clone());
        assert_eq!(zeroed.as_slice(), fixed.as_slice());
    }
}
