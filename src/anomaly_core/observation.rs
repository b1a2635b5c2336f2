//! Observation matrix with explicit per-cell presence.
//!
//! Missing entries are tracked in a boolean mask next to the values rather
//! than through NaN sentinels, so distance code can check presence directly.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::utils::AnalysisError;

/// Which dimension of the input holds the observations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Each row is one observation (the usual layout)
    #[default]
    Rows,
    /// Each column is one observation; the matrix is transposed before scoring
    Columns,
}

/// n observations x d coordinates, any of which may be missing
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationMatrix {
    values: Array2<f64>,
    present: Array2<bool>,
}

impl ObservationMatrix {
    /// Build from a value matrix and a same-shaped presence mask.
    ///
    /// Values at absent cells are never read.
    pub fn new(values: Array2<f64>, present: Array2<bool>) -> Result<Self, AnalysisError> {
        if values.dim() != present.dim() {
            return Err(AnalysisError::config(format!(
                "value matrix {:?} and presence mask {:?} dimensions differ",
                values.dim(),
                present.dim()
            )));
        }
        Ok(Self { values, present })
    }

    /// Build from a matrix where every cell is present
    pub fn from_dense(values: Array2<f64>) -> Self {
        let present = Array2::from_elem(values.dim(), true);
        Self { values, present }
    }

    /// Build from a matrix that marks missing cells with NaN
    pub fn from_nan_sentinel(values: Array2<f64>) -> Self {
        let present = values.mapv(|v| !v.is_nan());
        let values = values.mapv(|v| if v.is_nan() { 0.0 } else { v });
        Self { values, present }
    }

    /// Build from row vectors; `None` marks a missing coordinate.
    pub fn from_rows(rows: &[Vec<Option<f64>>]) -> Result<Self, AnalysisError> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut values = Array2::zeros((rows.len(), width));
        let mut present = Array2::from_elem((rows.len(), width), false);

        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(AnalysisError::shape(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
            for (j, cell) in row.iter().enumerate() {
                if let Some(v) = cell {
                    values[[i, j]] = *v;
                    present[[i, j]] = true;
                }
            }
        }

        Ok(Self { values, present })
    }

    /// A single fully observed series as an n x 1 matrix
    pub fn from_series(series: &[f64]) -> Self {
        let values = Array2::from_shape_fn((series.len(), 1), |(i, _)| series[i]);
        Self::from_dense(values)
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn presence(&self) -> &Array2<bool> {
        &self.present
    }

    /// Value at (row, col), `None` if missing
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if self.present[[row, col]] {
            Some(self.values[[row, col]])
        } else {
            None
        }
    }

    pub fn row_values(&self, row: usize) -> ArrayView1<'_, f64> {
        self.values.row(row)
    }

    pub fn row_presence(&self, row: usize) -> ArrayView1<'_, bool> {
        self.present.row(row)
    }

    /// Row has no observed coordinate at all
    pub fn is_row_empty(&self, row: usize) -> bool {
        !self.present.row(row).iter().any(|&p| p)
    }

    /// Row has at least one missing coordinate
    pub fn is_row_incomplete(&self, row: usize) -> bool {
        self.present.row(row).iter().any(|&p| !p)
    }

    /// Matrix laid out with observations along rows
    pub fn oriented(&self, axis: Axis) -> ObservationMatrix {
        match axis {
            Axis::Rows => self.clone(),
            Axis::Columns => ObservationMatrix {
                values: self.values.t().to_owned(),
                present: self.present.t().to_owned(),
            },
        }
    }

    /// Copy with the same presence mask and new values at present cells
    pub fn map_present<F>(&self, mut f: F) -> ObservationMatrix
    where
        F: FnMut(usize, f64) -> f64,
    {
        let mut values = self.values.clone();
        for ((i, j), v) in values.indexed_iter_mut() {
            if self.present[[i, j]] {
                *v = f(j, *v);
            }
        }
        ObservationMatrix {
            values,
            present: self.present.clone(),
        }
    }

    /// Validate the matrix shape and observed values
    ///
    /// # Returns
    /// * `Ok(())` if non-empty and every present value is finite
    /// * `Err(AnalysisError::InputShape)` otherwise
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.nrows() == 0 {
            return Err(AnalysisError::shape("observation matrix cannot be empty"));
        }

        if self.ncols() == 0 {
            return Err(AnalysisError::shape(
                "observation matrix must have at least one column",
            ));
        }

        for ((i, j), v) in self.values.indexed_iter() {
            if self.present[[i, j]] && !v.is_finite() {
                return Err(AnalysisError::shape(format!(
                    "observed value at ({}, {}) is not finite",
                    i, j
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_from_rows_tracks_missing() {
        let m = ObservationMatrix::from_rows(&[
            vec![Some(1.0), None],
            vec![Some(3.0), Some(4.0)],
        ])
        .unwrap();

        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 2);
        assert_eq!(m.get(0, 0), Some(1.0));
        assert_eq!(m.get(0, 1), None);
        assert!(m.is_row_incomplete(0));
        assert!(!m.is_row_incomplete(1));
        assert!(!m.is_row_empty(0));
    }

    #[test]
    fn test_from_rows_ragged() {
        let result = ObservationMatrix::from_rows(&[vec![Some(1.0)], vec![Some(1.0), Some(2.0)]]);
        assert!(matches!(result, Err(AnalysisError::InputShape(_))));
    }

    #[test]
    fn test_new_dimension_mismatch() {
        let result = ObservationMatrix::new(
            Array2::zeros((2, 2)),
            Array2::from_elem((2, 3), true),
        );
        assert!(matches!(result, Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn test_from_nan_sentinel() {
        let m = ObservationMatrix::from_nan_sentinel(arr2(&[[1.0, f64::NAN], [f64::NAN, f64::NAN]]));
        assert_eq!(m.get(0, 0), Some(1.0));
        assert_eq!(m.get(0, 1), None);
        assert!(m.is_row_empty(1));
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_oriented_columns_transposes() {
        let m = ObservationMatrix::from_dense(arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));
        let t = m.oriented(Axis::Columns);
        assert_eq!(t.nrows(), 3);
        assert_eq!(t.ncols(), 2);
        assert_eq!(t.get(2, 1), Some(6.0));
        assert_eq!(m.oriented(Axis::Rows), m);
    }

    #[test]
    fn test_validate_empty_rows() {
        let m = ObservationMatrix::from_dense(Array2::<f64>::zeros((0, 2)));
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_validate_empty_cols() {
        let m = ObservationMatrix::from_dense(Array2::<f64>::zeros((2, 0)));
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_validate_with_inf() {
        let m = ObservationMatrix::from_dense(arr2(&[[1.0, f64::INFINITY], [3.0, 4.0]]));
        let result = m.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not finite"));
    }

    #[test]
    fn test_map_present_skips_missing() {
        let m = ObservationMatrix::from_rows(&[vec![Some(1.0), None]]).unwrap();
        let doubled = m.map_present(|_, v| v * 2.0);
        assert_eq!(doubled.get(0, 0), Some(2.0));
        assert_eq!(doubled.get(0, 1), None);
    }
}
