/// Utility modules for errors, parameter validation and column scaling
pub mod error;
pub mod scaling;
pub mod type_convert;

// Re-export commonly used types
pub use error::AnalysisError;
pub use scaling::{min_max_scale, scale, standard_scale, ScalingMethod};
pub use type_convert::{validate_fraction, validate_open_unit, validate_positive};
