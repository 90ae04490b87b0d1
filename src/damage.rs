//! Damagers: controlled corruption of a feature table.
//!
//! Each variant simulates a real-world data quality issue. Damage compounds
//! when applied repeatedly; nothing here is idempotent.

use rand::rngs::StdRng;
use rand::Rng;

use crate::data::{DataError, Matrix};

/// Closed set of damage transformations.
///
/// The per-call quantity travels inside the variant: a `(damager, quantity)`
/// pair is exactly an enum payload, which keeps invalid pairings
/// unrepresentable. Variants are stateless; randomness is an explicit input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damage {
    /// Replace a proportion in `[0, 1)` of all cells with the missing
    /// sentinel (NaN). Cell positions are drawn uniformly without
    /// replacement across the flattened table; shape is unchanged.
    NaCells(f64),

    /// Append this many trailing columns of uniform `[0, 1)` noise with the
    /// same row count. Original columns keep their values and positions.
    NoiseFeatures(usize),

    /// Replace a proportion in `[0, 1)` of all cells with uniform `[0, 1)`
    /// noise. Same cell selection as [`Damage::NaCells`]; shape is unchanged.
    NoiseValues(f64),
}

impl Damage {
    /// Apply the damage to a feature table.
    pub fn apply(&self, mut matrix: Matrix, rng: &mut StdRng) -> Result<Matrix, DataError> {
        match *self {
            Damage::NaCells(proportion) => {
                overwrite_cells(&mut matrix, proportion, rng, |_| f64::NAN)?;
                Ok(matrix)
            }
            Damage::NoiseValues(proportion) => {
                overwrite_cells(&mut matrix, proportion, rng, |rng| rng.gen::<f64>())?;
                Ok(matrix)
            }
            Damage::NoiseFeatures(count) => Ok(append_noise_columns(&matrix, count, rng)),
        }
    }

    /// Variant name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Damage::NaCells(_) => "na_cells",
            Damage::NoiseFeatures(_) => "noise_features",
            Damage::NoiseValues(_) => "noise_values",
        }
    }
}

/// Overwrite `floor(cells * proportion)` distinct cells with `value(rng)`.
fn overwrite_cells(
    matrix: &mut Matrix,
    proportion: f64,
    rng: &mut StdRng,
    mut value: impl FnMut(&mut StdRng) -> f64,
) -> Result<(), DataError> {
    if !(0.0..1.0).contains(&proportion) {
        return Err(DataError::DamageProportionOutOfRange(proportion));
    }
    let count = (matrix.len() as f64 * proportion).floor() as usize;
    let chosen = rand::seq::index::sample(rng, matrix.len(), count);
    let data = matrix.as_mut_slice();
    for i in chosen {
        data[i] = value(rng);
    }
    Ok(())
}

/// Concatenate `count` uniform-noise columns after the existing ones.
fn append_noise_columns(matrix: &Matrix, count: usize, rng: &mut StdRng) -> Matrix {
    let rows = matrix.num_rows();
    let cols = matrix.num_cols();
    let mut data = Vec::with_capacity(rows * (cols + count));
    for row in matrix.rows() {
        data.extend_from_slice(row);
        data.extend((0..count).map(|_| rng.gen::<f64>()));
    }
    Matrix::from_vec(data, rows, cols + count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn arange(rows: usize, cols: usize) -> Matrix {
        Matrix::from_vec((0..rows * cols).map(|v| v as f64).collect(), rows, cols)
    }

    #[test]
    fn na_cells_hits_exact_count() {
        let mut rng = StdRng::seed_from_u64(11);
        let m = Damage::NaCells(0.5).apply(arange(5, 5), &mut rng).unwrap();
        assert_eq!((m.num_rows(), m.num_cols()), (5, 5));
        assert_eq!(m.num_missing(), 12); // floor(25 * 0.5)
    }

    #[test]
    fn na_cells_leaves_other_cells_untouched() {
        let mut rng = StdRng::seed_from_u64(12);
        let original = arange(6, 4);
        let damaged = Damage::NaCells(0.25)
            .apply(original.clone(), &mut rng)
            .unwrap();
        let unchanged = damaged
            .as_slice()
            .iter()
            .zip(original.as_slice())
            .filter(|(d, o)| d == o)
            .count();
        assert_eq!(unchanged, 24 - 6); // floor(24 * 0.25) damaged
    }

    #[test]
    fn na_cells_compounds() {
        let mut rng = StdRng::seed_from_u64(13);
        let once = Damage::NaCells(0.2).apply(arange(10, 10), &mut rng).unwrap();
        let twice = Damage::NaCells(0.2).apply(once.clone(), &mut rng).unwrap();
        assert!(twice.num_missing() >= once.num_missing());
        assert!(twice.num_missing() <= twice.len());
    }

    #[test]
    fn na_cells_rejects_out_of_range_proportion() {
        let mut rng = StdRng::seed_from_u64(14);
        for q in [1.0, 1.5, -0.1] {
            let err = Damage::NaCells(q).apply(arange(2, 2), &mut rng).unwrap_err();
            assert!(matches!(err, DataError::DamageProportionOutOfRange(_)));
        }
    }

    #[test]
    fn noise_features_appends_trailing_columns() {
        let mut rng = StdRng::seed_from_u64(15);
        let original = arange(5, 5);
        let damaged = Damage::NoiseFeatures(10)
            .apply(original.clone(), &mut rng)
            .unwrap();
        assert_eq!(damaged.num_cols(), 15);
        assert_eq!(damaged.num_rows(), 5);
        for r in 0..5 {
            assert_eq!(&damaged.row_slice(r)[..5], original.row_slice(r));
            assert!(damaged.row_slice(r)[5..]
                .iter()
                .all(|v| (0.0..1.0).contains(v)));
        }
    }

    #[test]
    fn noise_values_replaces_with_finite_noise() {
        let mut rng = StdRng::seed_from_u64(16);
        let original = arange(5, 5);
        let damaged = Damage::NoiseValues(0.5)
            .apply(original.clone(), &mut rng)
            .unwrap();
        assert_eq!((damaged.num_rows(), damaged.num_cols()), (5, 5));
        assert_eq!(damaged.num_missing(), 0);
        let changed = damaged
            .as_slice()
            .iter()
            .zip(original.as_slice())
            .filter(|(d, o)| d != o)
            .count();
        // arange values are >= 0 and mostly >= 1; noise lands in [0, 1).
        assert_eq!(changed, 12);
        for (d, o) in damaged.as_slice().iter().zip(original.as_slice()) {
            if d != o {
                assert!((0.0..1.0).contains(d));
            }
        }
    }
}
