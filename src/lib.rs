//! Fast Anomaly Engine - discord discovery and outlier detection
//!
//! Two engines share one mask type: the discord engine flags the most
//! unusual subsequences of a numeric series across a range of window
//! lengths, and the outlier engine flags observations whose nearest
//! neighbors are unusually far away, with missing values allowed.

pub mod anomaly_core;
pub mod arrow_handler;
pub mod dataset;
pub mod engine;
pub mod parallel;
pub mod stats;
pub mod utils;

pub use anomaly_core::{
    detect_discords, detect_outliers, AnomalyMask, Axis, DiscordConfig, DiscordDetector, ObservationMatrix,
    OutlierConfig, OutlierDetector,
};
pub use dataset::Dataset;
pub use engine::{AnomalyEngine, Detection, DetectorConfig};
pub use stats::Statistics;
pub use utils::AnalysisError;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
