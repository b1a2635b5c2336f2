//! K-nearest-neighbor outlyingness scores with coordinate-wise missing-value exclusion
//!
//! Distances are computed brute force over the coordinates two rows both
//! observe, so partially missing rows still take part in the comparisons
//! they can support. Rows sharing no observed coordinate are simply not
//! neighbors of each other.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::observation::ObservationMatrix;
use crate::iter_maybe_parallel;
use crate::utils::{validate_positive, AnalysisError};
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;

/// How a row's k nearest distances collapse into one score
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAggregation {
    /// Distance at the largest step in the sorted neighbor distances,
    /// counting the step up from zero to the first neighbor
    #[default]
    MaxGap,
    /// Mean of the k nearest distances
    Mean,
}

impl ScoreAggregation {
    /// Aggregate ascending distances; `None` when there are none
    pub fn aggregate(self, sorted: &[f64]) -> Option<f64> {
        if sorted.is_empty() {
            return None;
        }
        match self {
            ScoreAggregation::Mean => Some(sorted.iter().sum::<f64>() / sorted.len() as f64),
            ScoreAggregation::MaxGap => {
                let mut prev = 0.0;
                let mut widest = f64::NEG_INFINITY;
                let mut at = sorted[0];
                for &d in sorted {
                    if d - prev > widest {
                        widest = d - prev;
                        at = d;
                    }
                    prev = d;
                }
                Some(at)
            }
        }
    }
}

/// Euclidean distance over coordinates observed in both rows.
///
/// Returns `None` when the rows share no observed coordinate.
pub fn pairwise_distance(matrix: &ObservationMatrix, a: usize, b: usize) -> Option<f64> {
    let (va, pa) = (matrix.row_values(a), matrix.row_presence(a));
    let (vb, pb) = (matrix.row_values(b), matrix.row_presence(b));

    let mut sum = 0.0;
    let mut shared = 0usize;
    for j in 0..matrix.ncols() {
        if pa[j] && pb[j] {
            let diff = va[j] - vb[j];
            sum += diff * diff;
            shared += 1;
        }
    }

    if shared == 0 {
        None
    } else {
        Some(sum.sqrt())
    }
}

/// Up to `k` smallest distances from `row` to the other usable rows, ascending
pub fn nearest_distances(matrix: &ObservationMatrix, row: usize, k: usize, usable: &[bool]) -> Vec<f64> {
    let mut distances: Vec<f64> = (0..matrix.nrows())
        .filter(|&other| other != row && usable[other])
        .filter_map(|other| pairwise_distance(matrix, row, other))
        .collect();

    if distances.len() > k {
        distances.select_nth_unstable_by(k - 1, f64::total_cmp);
        distances.truncate(k);
    }
    distances.sort_by(f64::total_cmp);
    distances
}

/// Compute outlyingness scores from k nearest neighbors
///
/// # Arguments
/// * `matrix` - Observations (rows) x coordinates, missing cells allowed
/// * `k` - Number of nearest neighbors to consider (`0 < k < n`)
/// * `aggregation` - How the k distances become a score
/// * `usable` - Rows allowed to be scored and to serve as neighbors
///
/// # Returns
/// * `Ok(Vec<Option<f64>>)` - One score per row; `None` for rows that are not
///   usable or have no comparable neighbor
/// * `Err(AnalysisError)` - If the matrix is empty or `k` is out of range
pub fn knn_anomaly_scores(
    matrix: &ObservationMatrix,
    k: usize,
    aggregation: ScoreAggregation,
    usable: &[bool],
) -> Result<Vec<Option<f64>>, AnalysisError> {
    let n_rows = matrix.nrows();

    if n_rows == 0 {
        return Err(AnalysisError::shape(
            "cannot compute anomaly scores on empty dataset",
        ));
    }
    validate_positive("k", k)?;
    if k >= n_rows {
        return Err(AnalysisError::config(format!(
            "k ({}) must be less than the number of observations ({})",
            k, n_rows
        )));
    }
    if usable.len() != n_rows {
        return Err(AnalysisError::config(format!(
            "usable mask has {} entries for {} observations",
            usable.len(),
            n_rows
        )));
    }

    debug!(rows = n_rows, cols = matrix.ncols(), k, "computing nearest neighbor scores");

    let scores: Vec<Option<f64>> = iter_maybe_parallel!(0..n_rows)
        .map(|row| {
            if !usable[row] {
                return None;
            }
            aggregation.aggregate(&nearest_distances(matrix, row, k, usable))
        })
        .collect();

    Ok(scores)
}
