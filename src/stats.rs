/// Relative tolerance under which a window's spread counts as zero
pub const FLAT_TOLERANCE: f64 = 1e-10;

/// Summary statistics of a slice of values
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

impl Statistics {
    /// Compute statistics over `values`, `None` when empty
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let sum: f64 = values.iter().sum();
        let mean = sum / count as f64;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Statistics {
            count,
            mean,
            std: var.max(0.0).sqrt(),
            min,
            max,
            sum,
        })
    }

    /// Spread is zero up to floating point noise
    pub fn is_flat(&self) -> bool {
        self.std <= FLAT_TOLERANCE * self.mean.abs().max(1.0)
    }
}

/// Mean of `values`, 0.0 when empty
pub fn mean(values: &[f64]) -> f64 {
    Statistics::compute(values).map(|s| s.mean).unwrap_or(0.0)
}

/// Population standard deviation of `values`, 0.0 when empty
pub fn population_std(values: &[f64]) -> f64 {
    Statistics::compute(values).map(|s| s.std).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_compute() {
        let stats = Statistics::compute(&[10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();

        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, 30.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 50.0);
        assert_eq!(stats.sum, 150.0);
        assert!((stats.std - 200.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_statistics_empty() {
        assert!(Statistics::compute(&[]).is_none());
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std(&[]), 0.0);
    }

    #[test]
    fn test_is_flat() {
        assert!(Statistics::compute(&[-858.1; 6]).unwrap().is_flat());
        assert!(Statistics::compute(&[0.0, 0.0, 0.0]).unwrap().is_flat());
        assert!(!Statistics::compute(&[1.0, 1.0, 1.001]).unwrap().is_flat());
    }

    #[test]
    fn test_population_std() {
        assert!((population_std(&[1.0, 2.0, 3.0]) - (2.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }
}
