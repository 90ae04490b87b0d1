//! Dense row-major feature table.
//!
//! Missing cells are represented as `f64::NAN`.

use super::DataError;

/// Dense row-major `f64` matrix.
///
/// Rows are observations, columns are feature values. All elements are stored
/// contiguously as `[row0_col0, row0_col1, ..., row1_col0, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Box<[f64]>,
    num_rows: usize,
    num_cols: usize,
}

impl Matrix {
    /// Create a matrix from a flat row-major vec, taking ownership.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != num_rows * num_cols`.
    pub fn from_vec(data: Vec<f64>, num_rows: usize, num_cols: usize) -> Self {
        assert_eq!(
            data.len(),
            num_rows * num_cols,
            "Data length {} does not match dimensions {}x{}",
            data.len(),
            num_rows,
            num_cols
        );
        Self {
            data: data.into_boxed_slice(),
            num_rows,
            num_cols,
        }
    }

    /// Create a matrix from a slice of rows, validating rectangular 2D shape.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, DataError> {
        let num_rows = rows.len();
        let num_cols = rows.first().map(Vec::len).unwrap_or(0);
        if num_rows == 0 || num_cols == 0 {
            return Err(DataError::EmptyTable);
        }
        let mut data = Vec::with_capacity(num_rows * num_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != num_cols {
                return Err(DataError::RaggedRows {
                    row: i,
                    expected: num_cols,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self::from_vec(data, num_rows, num_cols))
    }

    /// Parse a matrix from plain text: one row per line, values separated by
    /// whitespace or commas. Blank lines are skipped.
    pub fn from_text(text: &str) -> Result<Self, DataError> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut row = Vec::new();
            for (j, token) in line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .enumerate()
            {
                let value = token.parse::<f64>().map_err(|_| DataError::ParseValue {
                    row: i,
                    col: j,
                    value: token.to_string(),
                })?;
                row.push(value);
            }
            rows.push(row);
        }
        Self::from_rows(&rows)
    }

    /// Number of rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    #[inline]
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the matrix has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The underlying row-major data.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the underlying row-major data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Cell value at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.num_cols + col]
    }

    /// Set the cell at `(row, col)`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.num_cols + col] = value;
    }

    /// One row as a contiguous slice.
    #[inline]
    pub fn row_slice(&self, row: usize) -> &[f64] {
        let start = row * self.num_cols;
        &self.data[start..start + self.num_cols]
    }

    /// Iterate over rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.num_cols)
    }

    /// Number of missing (NaN) cells.
    pub fn num_missing(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }

    /// Copy out the given rows, in order, into a new matrix.
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.num_cols);
        for &i in indices {
            data.extend_from_slice(self.row_slice(i));
        }
        Self::from_vec(data, indices.len(), self.num_cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rectangular() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.num_rows(), 2);
        assert_eq!(m.num_cols(), 3);
        assert_eq!(m.row_slice(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.get(0, 2), 3.0);
    }

    #[test]
    fn from_rows_rejects_ragged() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            DataError::RaggedRows {
                row: 1,
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn from_rows_rejects_empty() {
        assert!(matches!(
            Matrix::from_rows(&[]).unwrap_err(),
            DataError::EmptyTable
        ));
        assert!(matches!(
            Matrix::from_rows(&[vec![], vec![]]).unwrap_err(),
            DataError::EmptyTable
        ));
    }

    #[test]
    fn from_text_parses_mixed_separators() {
        let m = Matrix::from_text("1, 2, 3\n4 5 6\n").unwrap();
        assert_eq!(m.num_rows(), 2);
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn from_text_rejects_non_numeric() {
        let err = Matrix::from_text("1 a 3\n").unwrap_err();
        match err {
            DataError::ParseValue { row, col, value } => {
                assert_eq!((row, col), (0, 1));
                assert_eq!(value, "a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn take_rows_copies_in_order() {
        let m = Matrix::from_vec((0..12).map(|v| v as f64).collect(), 4, 3);
        let sub = m.take_rows(&[3, 0]);
        assert_eq!(sub.num_rows(), 2);
        assert_eq!(sub.row_slice(0), &[9.0, 10.0, 11.0]);
        assert_eq!(sub.row_slice(1), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn missing_count() {
        let mut m = Matrix::from_vec(vec![1.0; 6], 2, 3);
        assert_eq!(m.num_missing(), 0);
        m.set(1, 2, f64::NAN);
        assert_eq!(m.num_missing(), 1);
    }
}
