use serde::{Deserialize, Serialize};
use tracing::info;

use crate::anomaly_core::{
    AnomalyMask, Axis, DiscordConfig, DiscordDetector, DiscordReport, ObservationMatrix, OutlierConfig,
    OutlierDetector, OutlierReport,
};
use crate::dataset::Dataset;
use crate::utils::{scale, AnalysisError, ScalingMethod};

/// Which engine runs, with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum DetectorConfig {
    Discord(DiscordConfig),
    Outlier(OutlierConfig),
}

/// Output of one engine run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum Detection {
    Discord(DiscordReport),
    Outlier(OutlierReport),
}

impl Detection {
    pub fn mask(&self) -> &AnomalyMask {
        match self {
            Detection::Discord(r) => &r.mask,
            Detection::Outlier(r) => &r.mask,
        }
    }
}

/// Runs either engine over loaded datasets
///
/// The engine keeps no state between runs; it only carries the input
/// options that sit outside both engines' parameters.
#[derive(Debug, Clone, Default)]
pub struct AnomalyEngine {
    /// Series column for discord runs; the only column is used when unset
    column: Option<String>,
    /// Orientation of outlier observations
    axis: Axis,
    /// Column scaling applied before outlier scoring
    scaling: ScalingMethod,
}

impl AnomalyEngine {
    /// Create a new engine with default input options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_scaling(mut self, scaling: ScalingMethod) -> Self {
        self.scaling = scaling;
        self
    }

    /// Discord search over one series
    pub fn run_discord(&self, series: &[f64], config: &DiscordConfig) -> Result<DiscordReport, AnalysisError> {
        DiscordDetector::new(config.clone()).search(series)
    }

    /// Outlier scoring over an observation matrix, scaled first if requested
    pub fn run_outlier(
        &self,
        matrix: &ObservationMatrix,
        config: &OutlierConfig,
    ) -> Result<OutlierReport, AnalysisError> {
        matrix.validate()?;
        let observations = scale(&matrix.oriented(self.axis), self.scaling)?;
        OutlierDetector::new(config.clone()).score(&observations, Axis::Rows)
    }

    /// Run the configured engine over a dataset
    pub fn run(&self, dataset: &Dataset, config: &DetectorConfig) -> crate::Result<Detection> {
        info!(dataset = %dataset.name, rows = dataset.len(), "running detection");

        let detection = match config {
            DetectorConfig::Discord(cfg) => {
                let column = self.series_column(dataset)?;
                let series = dataset.series(&column)?;
                Detection::Discord(self.run_discord(&series, cfg)?)
            }
            DetectorConfig::Outlier(cfg) => {
                let matrix = dataset.to_observations()?;
                Detection::Outlier(self.run_outlier(&matrix, cfg)?)
            }
        };

        info!(flagged = detection.mask().count(), of = detection.mask().len(), "detection finished");
        Ok(detection)
    }

    fn series_column(&self, dataset: &Dataset) -> Result<String, AnalysisError> {
        match (&self.column, dataset.columns.as_slice()) {
            (Some(c), _) => Ok(c.clone()),
            (None, [only]) => Ok(only.clone()),
            (None, cols) => Err(AnalysisError::config(format!(
                "discord search needs a series column, dataset has {}",
                cols.len()
            ))),
        }
    }
}
