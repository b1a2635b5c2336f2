use super::error::AnalysisError;

/// Validate that `value` lies in the open interval (0, 1)
///
/// # Arguments
/// * `name` - Parameter name used in the error message
/// * `value` - The value to validate
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(AnalysisError::Configuration)` if out of range or not finite
pub fn validate_open_unit(name: &str, value: f64) -> Result<(), AnalysisError> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(AnalysisError::config(format!(
            "{} must be in (0, 1), got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate that `value` lies in the half-open interval (0, 1]
pub fn validate_fraction(name: &str, value: f64) -> Result<(), AnalysisError> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(AnalysisError::config(format!(
            "{} must be in (0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate a strictly positive count parameter
pub fn validate_positive(name: &str, value: usize) -> Result<(), AnalysisError> {
    if value == 0 {
        return Err(AnalysisError::config(format!("{} must be > 0", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_open_unit() {
        assert!(validate_open_unit("alpha", 0.01).is_ok());
        assert!(validate_open_unit("alpha", 0.5).is_ok());
        assert!(validate_open_unit("alpha", 0.0).is_err());
        assert!(validate_open_unit("alpha", 1.0).is_err());
        assert!(validate_open_unit("alpha", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_fraction() {
        assert!(validate_fraction("p", 1.0).is_ok());
        assert!(validate_fraction("p", 0.5).is_ok());
        assert!(validate_fraction("p", 0.0).is_err());
        assert!(validate_fraction("p", 1.5).is_err());
        assert!(validate_fraction("p", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_open_unit_error_message() {
        let err = validate_open_unit("alpha", 1.5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ConfigurationError: alpha must be in (0, 1), got 1.5"
        );
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("k", 1).is_ok());
        assert!(validate_positive("k", 0).is_err());
    }
}
