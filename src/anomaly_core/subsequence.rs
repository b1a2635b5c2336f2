//! Subsequence extraction and z-normalized window distance.

use crate::stats::Statistics;

/// A contiguous window of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subsequence {
    pub start: usize,
    pub length: usize,
}

impl Subsequence {
    /// One past the last covered index
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Every window of one length, each z-normalized independently.
///
/// Zero-variance windows normalize to the zero vector: two flat windows are
/// at distance 0 and a flat window sits at `sqrt(length)` from any other.
#[derive(Debug, Clone)]
pub struct WindowSet {
    length: usize,
    count: usize,
    normalized: Vec<f64>,
    flat: Vec<bool>,
}

impl WindowSet {
    /// Slide a window of `length` over `series`.
    ///
    /// Callers guarantee `2 <= length <= series.len()`.
    pub fn extract(series: &[f64], length: usize) -> Self {
        let count = series.len() + 1 - length;
        let mut normalized = vec![0.0; count * length];
        let mut flat = vec![false; count];

        for (start, window) in series.windows(length).enumerate() {
            let stats = match Statistics::compute(window) {
                Some(s) => s,
                None => continue,
            };
            if stats.is_flat() {
                flat[start] = true;
                continue;
            }
            let out = &mut normalized[start * length..(start + 1) * length];
            for (o, &v) in out.iter_mut().zip(window) {
                *o = (v - stats.mean) / stats.std;
            }
        }

        Self {
            length,
            count,
            normalized,
            flat,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of windows (`n - length + 1`)
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_flat(&self, start: usize) -> bool {
        self.flat[start]
    }

    pub fn window(&self, start: usize) -> &[f64] {
        &self.normalized[start * self.length..(start + 1) * self.length]
    }

    /// z-normalized Euclidean distance between the windows at `i` and `j`
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        if self.flat[i] && self.flat[j] {
            return 0.0;
        }
        self.window(i)
            .iter()
            .zip(self.window(j))
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_counts_windows() {
        let ws = WindowSet::extract(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(ws.len(), 3);
        assert_eq!(ws.length(), 3);
    }

    #[test]
    fn test_normalized_window_has_unit_variance() {
        let ws = WindowSet::extract(&[1.0, 5.0, 2.0, 8.0], 4);
        let w = ws.window(0);
        let stats = Statistics::compute(w).unwrap();
        assert!(stats.mean.abs() < 1e-12);
        assert!((stats.std - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_is_shift_and_scale_invariant() {
        // second window is 10x + 3 of the first
        let ws = WindowSet::extract(&[1.0, 4.0, 2.0, 13.0, 43.0, 23.0], 3);
        assert!(ws.distance(0, 3) < 1e-12);
        assert_eq!(ws.distance(0, 3), ws.distance(3, 0));
    }

    #[test]
    fn test_flat_windows() {
        let ws = WindowSet::extract(&[2.0, 2.0, 2.0, 2.0, 1.0, 3.0, 1.0], 3);
        assert!(ws.is_flat(0));
        assert!(ws.is_flat(1));
        assert!(!ws.is_flat(4));
        assert_eq!(ws.distance(0, 1), 0.0);
        assert!((ws.distance(0, 4) - 3.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_subsequence_end() {
        let s = Subsequence { start: 16, length: 5 };
        assert_eq!(s.end(), 21);
    }
}
