//! Range-bounded discord discovery over the windows of one length.
//!
//! [`drag`] finds the window whose nearest non-trivial neighbor is farthest
//! away, provided that distance is at least `r`. Phase 1 sweeps the series
//! once and keeps only windows with no neighbor closer than `r` among the
//! surviving candidates; phase 2 computes exact nearest-neighbor distances
//! for the survivors, dropping any that turn out to have a neighbor within `r`.
//! When `r` exceeds the true discord distance no candidate survives and the
//! caller retries with a smaller radius.

use serde::Serialize;
use tracing::trace;

use super::subsequence::{Subsequence, WindowSet};
use crate::iter_maybe_parallel;
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;

/// Best discord for one window length
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiscordCandidate {
    pub start: usize,
    pub length: usize,
    /// z-normalized distance to the nearest non-trivial neighbor
    pub distance: f64,
}

impl DiscordCandidate {
    pub fn subsequence(&self) -> Subsequence {
        Subsequence {
            start: self.start,
            length: self.length,
        }
    }

    /// Distance scaled by `1 / sqrt(length)`, comparable across lengths
    pub fn normalized_distance(&self) -> f64 {
        self.distance / (self.length as f64).sqrt()
    }
}

/// Indices closer than this to a window are trivial matches
pub fn exclusion_radius(length: usize, fraction: f64) -> usize {
    ((length as f64 * fraction).ceil() as usize).max(1)
}

/// Nearest-neighbor distance of window `i`.
///
/// Returns `None` when no window lies outside the exclusion zone, or when
/// `bound` is given and some neighbor is closer than it.
fn nearest_neighbor(windows: &WindowSet, i: usize, exclusion: usize, bound: Option<f64>) -> Option<f64> {
    let mut best = f64::INFINITY;
    for j in 0..windows.len() {
        if i.abs_diff(j) < exclusion {
            continue;
        }
        let d = windows.distance(i, j);
        if let Some(r) = bound {
            if d < r {
                return None;
            }
        }
        if d < best {
            best = d;
        }
    }
    if best.is_finite() {
        Some(best)
    } else {
        None
    }
}

/// Pick the largest distance, lowest start on ties
fn best_of(windows: &WindowSet, scored: impl Iterator<Item = (usize, Option<f64>)>) -> Option<DiscordCandidate> {
    let mut best: Option<DiscordCandidate> = None;
    for (start, dist) in scored {
        let Some(distance) = dist else { continue };
        if best.map_or(true, |b| distance > b.distance) {
            best = Some(DiscordCandidate {
                start,
                length: windows.length(),
                distance,
            });
        }
    }
    best
}

/// Discord with nearest-neighbor distance at least `r`, if one exists
pub fn drag(windows: &WindowSet, exclusion: usize, r: f64) -> Option<DiscordCandidate> {
    // phase 1: candidate selection
    let mut candidates: Vec<usize> = Vec::new();
    for i in 0..windows.len() {
        let mut is_candidate = !windows.is_flat(i);
        candidates.retain(|&j| {
            if i.abs_diff(j) < exclusion {
                return true;
            }
            if windows.distance(i, j) < r {
                is_candidate = false;
                false
            } else {
                true
            }
        });
        if is_candidate {
            candidates.push(i);
        }
    }

    trace!(
        length = windows.length(),
        radius = r,
        candidates = candidates.len(),
        "discord candidates selected"
    );

    if candidates.is_empty() {
        return None;
    }

    // phase 2: refinement
    let refined: Vec<Option<f64>> = iter_maybe_parallel!(candidates.clone())
        .map(|c| nearest_neighbor(windows, c, exclusion, Some(r)))
        .collect();

    best_of(windows, candidates.into_iter().zip(refined))
}

/// Nearest-neighbor distance for every window; flat windows get `None`
pub fn nearest_neighbor_profile(windows: &WindowSet, exclusion: usize) -> Vec<Option<f64>> {
    iter_maybe_parallel!(0..windows.len())
        .map(|i| {
            if windows.is_flat(i) {
                None
            } else {
                nearest_neighbor(windows, i, exclusion, None)
            }
        })
        .collect()
}

/// Discord from the full nearest-neighbor profile
pub fn exhaustive_discord(windows: &WindowSet, exclusion: usize) -> Option<DiscordCandidate> {
    let profile = nearest_neighbor_profile(windows, exclusion);
    best_of(windows, profile.into_iter().enumerate())
}
