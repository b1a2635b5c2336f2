use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::anomaly_core::ObservationMatrix;
use crate::stats::Statistics;
use crate::utils::AnalysisError;

/// Column scaling applied before outlier scoring
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMethod {
    /// Values used as given
    #[default]
    None,
    /// (x - min) / (max - min) -> [0, 1]
    MinMax,
    /// (x - mean) / std -> zero mean, unit variance
    Standard,
}

impl FromStr for ScalingMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "minmax" | "min-max" | "min_max" => Ok(Self::MinMax),
            "standard" | "zscore" => Ok(Self::Standard),
            other => Err(AnalysisError::config(format!("unknown scaling method '{}'", other))),
        }
    }
}

/// Observed values of each column
fn column_stats(matrix: &ObservationMatrix) -> Vec<Option<Statistics>> {
    (0..matrix.ncols())
        .map(|j| {
            let observed: Vec<f64> = (0..matrix.nrows()).filter_map(|i| matrix.get(i, j)).collect();
            Statistics::compute(&observed)
        })
        .collect()
}

/// Apply MinMax scaling column by column over the observed cells
///
/// # Returns
/// * `Ok(scaled)` - matrix with observed values in [0, 1], same missing cells
/// * `Err(AnalysisError)` - if an observed value is not finite
///
/// # Note
/// Constant columns (min == max) are set to 0.0
pub fn min_max_scale(matrix: &ObservationMatrix) -> Result<ObservationMatrix, AnalysisError> {
    matrix.validate()?;
    let stats = column_stats(matrix);

    Ok(matrix.map_present(|col, v| match &stats[col] {
        Some(s) if (s.max - s.min).abs() >= f64::EPSILON => (v - s.min) / (s.max - s.min),
        _ => 0.0,
    }))
}

/// Apply Standard scaling column by column over the observed cells
///
/// # Returns
/// * `Ok(scaled)` - matrix with zero-mean, unit-variance observed columns
/// * `Err(AnalysisError)` - if an observed value is not finite
///
/// # Note
/// Constant columns (std == 0) are set to 0.0
pub fn standard_scale(matrix: &ObservationMatrix) -> Result<ObservationMatrix, AnalysisError> {
    matrix.validate()?;
    let stats = column_stats(matrix);

    Ok(matrix.map_present(|col, v| match &stats[col] {
        Some(s) if s.std.abs() >= f64::EPSILON => (v - s.mean) / s.std,
        _ => 0.0,
    }))
}

/// Scale with the chosen method
pub fn scale(matrix: &ObservationMatrix, method: ScalingMethod) -> Result<ObservationMatrix, AnalysisError> {
    match method {
        ScalingMethod::None => Ok(matrix.clone()),
        ScalingMethod::MinMax => min_max_scale(matrix),
        ScalingMethod::Standard => standard_scale(matrix),
    }
}
