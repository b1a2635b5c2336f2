//! Outlier engine: nearest-neighbor scores with an extreme-value cutoff.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::knn::{knn_anomaly_scores, ScoreAggregation};
use super::mask::AnomalyMask;
use super::observation::{Axis, ObservationMatrix};
use super::threshold::{find_threshold, CutoffParams, OutlierTail};
use crate::utils::{validate_fraction, validate_open_unit, validate_positive, AnalysisError};

/// Treatment of rows with missing coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Compare rows over their jointly observed coordinates; only rows with
    /// no observed coordinate are left unscored
    #[default]
    Pairwise,
    /// Leave every row with a missing coordinate unscored and out of the
    /// neighbor search
    DropIncomplete,
}

/// Outlier engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Number of nearest neighbors
    pub k: usize,
    /// Significance level of the tail break
    pub alpha: f64,
    /// Share of the sorted scores eligible as outliers
    pub p: f64,
    /// Cap on the gap-smoothing window
    pub size_threshold: usize,
    pub outlier_tail: OutlierTail,
    pub aggregation: ScoreAggregation,
    pub missing: MissingPolicy,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            k: 10,
            alpha: 0.01,
            p: 0.5,
            size_threshold: 50,
            outlier_tail: OutlierTail::Max,
            aggregation: ScoreAggregation::MaxGap,
            missing: MissingPolicy::Pairwise,
        }
    }
}

impl OutlierConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_p(mut self, p: f64) -> Self {
        self.p = p;
        self
    }

    pub fn with_size_threshold(mut self, size_threshold: usize) -> Self {
        self.size_threshold = size_threshold;
        self
    }

    pub fn with_outlier_tail(mut self, tail: OutlierTail) -> Self {
        self.outlier_tail = tail;
        self
    }

    pub fn with_aggregation(mut self, aggregation: ScoreAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_missing(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    /// Check the parameters against `n` observations
    pub fn validate(&self, n: usize) -> Result<(), AnalysisError> {
        validate_positive("k", self.k)?;
        if self.k >= n {
            return Err(AnalysisError::config(format!(
                "k ({}) must be less than the number of observations ({})",
                self.k, n
            )));
        }
        validate_open_unit("alpha", self.alpha)?;
        validate_fraction("p", self.p)?;
        validate_positive("size_threshold", self.size_threshold)?;
        Ok(())
    }

    fn cutoff(&self) -> CutoffParams {
        CutoffParams {
            alpha: self.alpha,
            p: self.p,
            size_threshold: self.size_threshold,
        }
    }
}

/// Per-observation scores plus the emitted mask
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    /// `None` for observations that could not be scored
    pub scores: Vec<Option<f64>>,
    pub mask: AnomalyMask,
}

/// Point-wise outlier detector over an observation matrix
#[derive(Debug, Clone, Default)]
pub struct OutlierDetector {
    config: OutlierConfig,
}

impl OutlierDetector {
    pub fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    /// Score every observation and flag the extreme tail
    ///
    /// # Arguments
    /// * `matrix` - Observations with possibly missing cells
    /// * `axis` - Whether rows or columns are the observations
    ///
    /// # Returns
    /// * `Ok(OutlierReport)` - scores and a mask with one entry per observation
    /// * `Err(AnalysisError)` - on an empty matrix or invalid parameters
    pub fn score(&self, matrix: &ObservationMatrix, axis: Axis) -> Result<OutlierReport, AnalysisError> {
        matrix.validate()?;
        let observations = matrix.oriented(axis);
        let n = observations.nrows();
        let cfg = &self.config;
        cfg.validate(n)?;

        let usable: Vec<bool> = (0..n)
            .map(|i| match cfg.missing {
                MissingPolicy::Pairwise => !observations.is_row_empty(i),
                MissingPolicy::DropIncomplete => !observations.is_row_incomplete(i),
            })
            .collect();

        debug!(
            n,
            d = observations.ncols(),
            usable = usable.iter().filter(|&&u| u).count(),
            k = cfg.k,
            alpha = cfg.alpha,
            "starting outlier scoring"
        );

        let scores = knn_anomaly_scores(&observations, cfg.k, cfg.aggregation, &usable)?;

        let (scored_rows, scored): (Vec<usize>, Vec<f64>) = scores
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
            .unzip();

        let mut mask = AnomalyMask::empty(n);
        if scored.len() >= 2 {
            let flags = find_threshold(&scored, cfg.outlier_tail, &cfg.cutoff());
            for (row, flagged) in scored_rows.into_iter().zip(flags) {
                if flagged {
                    mask.set(row);
                }
            }
        }

        debug!(flagged = mask.count(), "outlier scoring complete");
        Ok(OutlierReport { scores, mask })
    }

    /// Anomaly mask with one entry per observation
    pub fn detect(&self, matrix: &ObservationMatrix, axis: Axis) -> Result<AnomalyMask, AnalysisError> {
        Ok(self.score(matrix, axis)?.mask)
    }
}

/// Run outlier detection with the given configuration over row observations
pub fn detect_outliers(matrix: &ObservationMatrix, config: OutlierConfig) -> Result<AnomalyMask, AnalysisError> {
    OutlierDetector::new(config).detect(matrix, Axis::Rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array2};

    const CLUSTER: [[f64; 3]; 12] = [
        [-1.207, -0.776, -0.694],
        [0.277, 0.064, -1.448],
        [1.084, 0.959, 0.575],
        [-2.346, -0.11, -1.024],
        [0.429, -0.511, -0.015],
        [0.506, -0.911, -0.936],
        [-0.575, -0.837, 1.102],
        [-0.547, 2.416, -0.476],
        [-0.564, 0.134, -0.709],
        [-0.89, -0.491, -0.501],
        [-0.477, -0.441, -1.629],
        [-0.998, 0.46, -1.168],
    ];

    fn cluster_rows() -> Vec<Vec<Option<f64>>> {
        CLUSTER
            .iter()
            .map(|r| r.iter().map(|&v| Some(v)).collect())
            .collect()
    }

    fn cluster_with_outlier() -> ObservationMatrix {
        let mut rows = cluster_rows();
        rows.push(vec![Some(10.0), Some(12.0), Some(10.0)]);
        ObservationMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_flags_isolated_row() {
        let mask = detect_outliers(&cluster_with_outlier(), OutlierConfig::default().with_k(3)).unwrap();
        assert_eq!(mask.len(), 13);
        assert_eq!(mask.indices(), vec![12]);
    }

    #[test]
    fn test_config_errors() {
        let m = cluster_with_outlier();
        let check = |cfg: OutlierConfig| detect_outliers(&m, cfg).unwrap_err().is_configuration();

        assert!(check(OutlierConfig::default().with_k(0)));
        assert!(check(OutlierConfig::default().with_k(13)));
        assert!(check(OutlierConfig::default().with_k(3).with_alpha(0.0)));
        assert!(check(OutlierConfig::default().with_k(3).with_alpha(1.0)));
        assert!(check(OutlierConfig::default().with_k(3).with_p(0.0)));
        assert!(check(OutlierConfig::default().with_k(3).with_size_threshold(0)));
    }

    #[test]
    fn test_empty_matrix_is_shape_error() {
        let m = ObservationMatrix::from_dense(Array2::zeros((0, 2)));
        let err = detect_outliers(&m, OutlierConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InputShape(_)));
    }

    #[test]
    fn test_fully_missing_row_is_not_flagged() {
        let mut rows = cluster_rows();
        rows.push(vec![None, None, None]);
        rows.push(vec![Some(10.0), Some(12.0), Some(10.0)]);
        let m = ObservationMatrix::from_rows(&rows).unwrap();

        let report = OutlierDetector::new(OutlierConfig::default().with_k(3))
            .score(&m, Axis::Rows)
            .unwrap();
        assert_eq!(report.scores.len(), 14);
        assert!(report.scores[12].is_none());
        assert!(!report.mask[12]);
        assert_eq!(report.mask.indices(), vec![13]);
    }

    #[test]
    fn test_all_rows_missing_gives_empty_mask() {
        let m = ObservationMatrix::from_rows(&[vec![None, None], vec![None, None], vec![None, None]]).unwrap();
        let mask = detect_outliers(&m, OutlierConfig::default().with_k(1)).unwrap();
        assert_eq!(mask, AnomalyMask::empty(3));
    }

    #[test]
    fn test_drop_incomplete_leaves_partial_rows_unflagged() {
        let mut rows = cluster_rows();
        rows.push(vec![Some(9.0), None, Some(9.0)]);
        let m = ObservationMatrix::from_rows(&rows).unwrap();

        let pairwise = detect_outliers(&m, OutlierConfig::default().with_k(3)).unwrap();
        assert_eq!(pairwise.indices(), vec![12]);

        let dropped = detect_outliers(
            &m,
            OutlierConfig::default().with_k(3).with_missing(MissingPolicy::DropIncomplete),
        )
        .unwrap();
        assert_eq!(dropped.len(), 13);
        assert_eq!(dropped.count(), 0);
    }

    #[test]
    fn test_columns_axis() {
        // 3 coordinates x 13 observations
        let m = cluster_with_outlier();
        let transposed = ObservationMatrix::from_dense(m.values().t().to_owned());
        let detector = OutlierDetector::new(OutlierConfig::default().with_k(3));
        let mask = detector.detect(&transposed, Axis::Columns).unwrap();
        assert_eq!(mask.len(), 13);
        assert_eq!(mask.indices(), vec![12]);
    }

    #[test]
    fn test_deterministic() {
        let m = ObservationMatrix::from_dense(arr2(&[
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [0.1, 0.1],
            [0.05, 0.05],
            [3.0, 3.0],
        ]));
        let detector = OutlierDetector::new(OutlierConfig::default().with_k(2));
        let a = detector.score(&m, Axis::Rows).unwrap();
        let b = detector.score(&m, Axis::Rows).unwrap();
        assert_eq!(a, b);
    }
}
