//! Extreme-value cutoff on sorted outlyingness scores.
//!
//! Scores are sorted ascending and the gaps between neighbors taken. Under an
//! exponential-tail assumption the bulk's gaps are small and homogeneous, so
//! each gap in the upper part of the sorted list is compared against a
//! weighted sum of the gaps just below it. The first gap exceeding
//! `ln(1 / alpha)` times that sum marks the break: every score above the one
//! preceding the break is flagged.

use serde::{Deserialize, Serialize};

/// Gaps below this fraction of the largest |score| are rounding noise and count as zero
pub const GAP_TOLERANCE: f64 = 1e-9;

/// Which tail of the score distribution is searched for the break
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierTail {
    /// Large scores (isolated points)
    #[default]
    Max,
    /// Small scores
    Min,
    /// Union of both tails
    Both,
}

/// Parameters of the cutoff search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoffParams {
    /// Significance level; smaller values demand a larger break
    pub alpha: f64,
    /// Share of the sorted scores, from the top, eligible as outliers
    pub p: f64,
    /// Upper bound on the number of gaps in the smoothing window
    pub size_threshold: usize,
}

/// Flags for scores strictly above the high-tail cutoff
fn high_tail(scores: &[f64], params: &CutoffParams) -> Vec<bool> {
    let n = scores.len();
    if n < 2 {
        return vec![false; n];
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]).then(a.cmp(&b)));
    let sorted: Vec<f64> = order.iter().map(|&i| scores[i]).collect();

    let scale = sorted.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()));
    let mut gaps = vec![0.0; n];
    for i in 1..n {
        let gap = sorted[i] - sorted[i - 1];
        if gap > GAP_TOLERANCE * scale {
            gaps[i] = gap;
        }
    }

    let n4 = params.size_threshold.min(n / 4).max(2);
    // positions below n4 - 1 have no full window of gaps beneath them
    let start = ((n as f64 * (1.0 - params.p)).floor() as usize).max(n4 - 1);
    let log_alpha = (1.0 / params.alpha).ln();
    let weight = (n4 - 1) as f64;

    let mut bound = f64::INFINITY;
    for i in start..n {
        let ghat: f64 = (2..=n4).map(|j| (j as f64 / weight) * gaps[i + 1 - j]).sum();
        if gaps[i] > log_alpha * ghat {
            bound = sorted[i - 1];
            break;
        }
    }

    scores.iter().map(|&s| s > bound).collect()
}

/// Flag the scores beyond the extreme-value cutoff of the chosen tail(s)
///
/// # Arguments
/// * `scores` - Outlyingness scores, any order
/// * `tail` - Which tail is searched
/// * `params` - alpha, p and size_threshold
///
/// # Returns
/// * One flag per score, aligned with `scores`
pub fn find_threshold(scores: &[f64], tail: OutlierTail, params: &CutoffParams) -> Vec<bool> {
    let negated = || scores.iter().map(|s| -s).collect::<Vec<f64>>();
    match tail {
        OutlierTail::Max => high_tail(scores, params),
        OutlierTail::Min => high_tail(&negated(), params),
        OutlierTail::Both => high_tail(scores, params)
            .into_iter()
            .zip(high_tail(&negated(), params))
            .map(|(a, b)| a || b)
            .collect(),
    }
}
