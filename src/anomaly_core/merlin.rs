//! Discord engine: adaptive-length discord discovery over a single series.
//!
//! Every length in `[min_length, max_length]` gets its own discord search.
//! The search radius for a length is seeded from the discords already found
//! and backs off after each failed attempt, up to `max_iterations` attempts;
//! past that cap an exhaustive nearest-neighbor profile settles the length.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::discord::{drag, exclusion_radius, exhaustive_discord, DiscordCandidate};
use super::mask::AnomalyMask;
use super::subsequence::WindowSet;
use crate::stats::{mean, population_std};
use crate::utils::{validate_fraction, validate_positive, AnalysisError};

/// Number of previous discord distances used to seed the radius
const HISTORY: usize = 5;

/// How the discords found are turned into a mask
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscordMaskMode {
    /// Flag the start index of each length's discord
    #[default]
    DiscordStarts,
    /// Flag every position covered by the discord with the largest
    /// nearest-neighbor distance over all lengths
    GlobalWindow,
    /// As `GlobalWindow`, ranked by `distance / sqrt(length)` instead
    NormalizedWindow,
}

/// Discord engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Retry cap per length before falling back to the exhaustive profile
    pub max_iterations: usize,
    /// Exclusion zone radius as a fraction of the window length
    pub exclusion_fraction: f64,
    pub mask_mode: DiscordMaskMode,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            min_length: 5,
            max_length: 50,
            max_iterations: 500,
            exclusion_fraction: 1.0,
            mask_mode: DiscordMaskMode::DiscordStarts,
        }
    }
}

impl DiscordConfig {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_exclusion_fraction(mut self, fraction: f64) -> Self {
        self.exclusion_fraction = fraction;
        self
    }

    pub fn with_mask_mode(mut self, mode: DiscordMaskMode) -> Self {
        self.mask_mode = mode;
        self
    }

    /// Check the parameters against a series of length `n`
    pub fn validate(&self, n: usize) -> Result<(), AnalysisError> {
        if n == 0 {
            return Err(AnalysisError::shape("series cannot be empty"));
        }
        if self.min_length < 2 {
            return Err(AnalysisError::config(format!(
                "min_length must be >= 2, got {}",
                self.min_length
            )));
        }
        if self.min_length > self.max_length {
            return Err(AnalysisError::config(format!(
                "min_length ({}) cannot exceed max_length ({})",
                self.min_length, self.max_length
            )));
        }
        if self.max_length >= n {
            return Err(AnalysisError::config(format!(
                "max_length ({}) must be less than the series length ({})",
                self.max_length, n
            )));
        }
        validate_positive("max_iterations", self.max_iterations)?;
        validate_fraction("exclusion_fraction", self.exclusion_fraction)?;
        Ok(())
    }
}

/// Discords found per length plus the emitted mask
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscordReport {
    /// One entry per length that has a discord, ascending by length
    pub discords: Vec<DiscordCandidate>,
    pub mask: AnomalyMask,
}

impl DiscordReport {
    /// Discord with the largest distance over all lengths
    pub fn global(&self) -> Option<&DiscordCandidate> {
        strongest(&self.discords, |d| d.distance)
    }
}

/// Highest ranked discord; ties go to the lowest start, then the shortest length
fn strongest(discords: &[DiscordCandidate], rank: impl Fn(&DiscordCandidate) -> f64) -> Option<&DiscordCandidate> {
    discords.iter().min_by(|a, b| {
        rank(b)
            .total_cmp(&rank(a))
            .then(a.start.cmp(&b.start))
            .then(a.length.cmp(&b.length))
    })
}

/// Radius backoff between failed attempts
#[derive(Debug, Clone, Copy)]
enum Backoff {
    Scale(f64),
    Subtract(f64),
}

impl Backoff {
    fn next(self, r: f64) -> f64 {
        let next = match self {
            Backoff::Scale(f) => r * f,
            Backoff::Subtract(s) => r - s,
        };
        next.max(0.0)
    }
}

/// Initial radius and backoff for the next length, from the discord
/// distances found so far
fn radius_schedule(min_length: usize, history: &[f64]) -> (f64, Backoff) {
    match history.len() {
        0 => (2.0 * (min_length as f64).sqrt(), Backoff::Scale(0.5)),
        len if len < HISTORY => (history[len - 1] * 0.99, Backoff::Scale(0.99)),
        len => {
            let recent = &history[len - HISTORY..];
            let m = mean(recent);
            let s = population_std(recent);
            if s > 0.0 {
                (m - 2.0 * s, Backoff::Subtract(s))
            } else {
                (m * 0.99, Backoff::Scale(0.99))
            }
        }
    }
}

/// Discord detector over a single numeric series
#[derive(Debug, Clone, Default)]
pub struct DiscordDetector {
    config: DiscordConfig,
}

impl DiscordDetector {
    pub fn new(config: DiscordConfig) -> Self {
        Self { config }
    }

    /// Search every length and emit the mask
    ///
    /// # Returns
    /// * `Ok(DiscordReport)` - discords per length and a mask of `series.len()`
    /// * `Err(AnalysisError)` - on an empty or non-finite series, or invalid lengths
    pub fn search(&self, series: &[f64]) -> Result<DiscordReport, AnalysisError> {
        let cfg = &self.config;
        cfg.validate(series.len())?;
        if let Some(i) = series.iter().position(|v| !v.is_finite()) {
            return Err(AnalysisError::shape(format!(
                "series value at index {} is not finite",
                i
            )));
        }

        debug!(
            n = series.len(),
            min_length = cfg.min_length,
            max_length = cfg.max_length,
            "starting discord search"
        );

        let mut discords = Vec::new();
        let mut history: Vec<f64> = Vec::new();

        for length in cfg.min_length..=cfg.max_length {
            let windows = WindowSet::extract(series, length);
            let exclusion = exclusion_radius(length, cfg.exclusion_fraction);
            let (r, backoff) = radius_schedule(cfg.min_length, &history);

            match self.find_discord(&windows, exclusion, r, backoff) {
                Some(d) => {
                    trace!(length, start = d.start, distance = d.distance, "discord found");
                    history.push(d.distance);
                    discords.push(d);
                }
                None => trace!(length, "no discord for length, skipping"),
            }
        }

        let mask = self.emit_mask(series.len(), &discords);
        debug!(
            discords = discords.len(),
            flagged = mask.count(),
            "discord search complete"
        );

        Ok(DiscordReport { discords, mask })
    }

    /// Anomaly mask of `series.len()` positions
    pub fn detect(&self, series: &[f64]) -> Result<AnomalyMask, AnalysisError> {
        Ok(self.search(series)?.mask)
    }

    fn find_discord(
        &self,
        windows: &WindowSet,
        exclusion: usize,
        initial: f64,
        backoff: Backoff,
    ) -> Option<DiscordCandidate> {
        if (0..windows.len()).all(|i| windows.is_flat(i)) {
            return None;
        }

        let mut r = initial.max(0.0);
        for attempt in 0..self.config.max_iterations {
            if let Some(d) = drag(windows, exclusion, r) {
                return Some(d);
            }
            if r == 0.0 {
                // a zero radius keeps every non-flat window
                return None;
            }
            trace!(length = windows.length(), attempt, radius = r, "radius too large, backing off");
            r = backoff.next(r);
        }

        warn!(
            length = windows.length(),
            max_iterations = self.config.max_iterations,
            "radius search exhausted, computing full profile"
        );
        exhaustive_discord(windows, exclusion)
    }

    fn emit_mask(&self, n: usize, discords: &[DiscordCandidate]) -> AnomalyMask {
        let winner = match self.config.mask_mode {
            DiscordMaskMode::DiscordStarts => {
                return AnomalyMask::from_indices(n, discords.iter().map(|d| d.start));
            }
            DiscordMaskMode::GlobalWindow => strongest(discords, |d| d.distance),
            DiscordMaskMode::NormalizedWindow => strongest(discords, DiscordCandidate::normalized_distance),
        };

        let mut mask = AnomalyMask::empty(n);
        if let Some(window) = winner.map(DiscordCandidate::subsequence) {
            mask.set_range(window.start, window.end());
        }
        mask
    }
}

/// Run discord detection with default settings for the given length range
///
/// # Arguments
/// * `series` - Ordered observations
/// * `min_length` - Shortest window length searched (>= 2)
/// * `max_length` - Longest window length searched (< series length)
pub fn detect_discords(
    series: &[f64],
    min_length: usize,
    max_length: usize,
) -> Result<AnomalyMask, AnalysisError> {
    DiscordDetector::new(DiscordConfig::new(min_length, max_length)).detect(series)
}
