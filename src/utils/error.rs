use thiserror::Error;

/// Error type for detection and data loading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Parameter contract violations (window lengths, k, alpha, ...)
    #[error("ConfigurationError: {0}")]
    Configuration(String),
    /// Empty input or inconsistent row widths
    #[error("InputShapeError: {0}")]
    InputShape(String),
    /// Unparseable CSV / JSON input
    #[error("DataError: {0}")]
    Data(String),
    /// Arrow-related errors (parsing, schema mismatch)
    #[error("ArrowError: {0}")]
    Arrow(String),
}

impl AnalysisError {
    pub fn config(msg: impl Into<String>) -> Self {
        AnalysisError::Configuration(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        AnalysisError::InputShape(msg.into())
    }

    /// True for errors raised by parameter validation
    pub fn is_configuration(&self) -> bool {
        matches!(self, AnalysisError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::config("k must be > 0");
        assert_eq!(err.to_string(), "ConfigurationError: k must be > 0");

        let err = AnalysisError::shape("empty series");
        assert_eq!(err.to_string(), "InputShapeError: empty series");

        let err = AnalysisError::Arrow("arrow test".to_string());
        assert_eq!(err.to_string(), "ArrowError: arrow test");

        let err = AnalysisError::Data("bad cell".to_string());
        assert_eq!(err.to_string(), "DataError: bad cell");
    }

    #[test]
    fn test_is_configuration() {
        assert!(AnalysisError::config("x").is_configuration());
        assert!(!AnalysisError::shape("x").is_configuration());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<AnalysisError>();
        assert_sync::<AnalysisError>();
    }
}
