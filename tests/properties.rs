//! Property tests over random series and observation matrices.

use fast_anomaly_engine::anomaly_core::{
    Axis, DiscordConfig, DiscordDetector, DiscordMaskMode, ObservationMatrix, OutlierConfig, OutlierDetector,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Series on a 0.1 grid so no distance underflows
fn arb_series(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((-1000i32..1000).prop_map(|v| v as f64 / 10.0), min..max)
}

/// Series plus a valid (min_length, max_length) pair
fn arb_discord_case() -> impl Strategy<Value = (Vec<f64>, usize, usize)> {
    (arb_series(20, 48), 2usize..6, 0usize..4).prop_map(|(series, min, extra)| (series, min, min + extra))
}

/// Rows of `d` cells, roughly one in six missing
fn arb_rows(n_min: usize, n_max: usize, d: usize) -> impl Strategy<Value = Vec<Vec<Option<f64>>>> {
    let cell = prop_oneof![
        5 => (-1000i32..1000).prop_map(|v| Some(v as f64 / 10.0)),
        1 => Just(None),
    ];
    prop::collection::vec(prop::collection::vec(cell, d), n_min..n_max)
}

fn flag_count(matrix: &ObservationMatrix, cfg: OutlierConfig) -> usize {
    OutlierDetector::new(cfg).detect(matrix, Axis::Rows).unwrap().count()
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// The discord mask always has one entry per series value.
    #[test]
    fn discord_mask_matches_series_length((series, min, max) in arb_discord_case()) {
        let mask = DiscordDetector::new(DiscordConfig::new(min, max)).detect(&series).unwrap();
        prop_assert_eq!(mask.len(), series.len());
        for i in mask.indices() {
            prop_assert!(i + min <= series.len());
        }
    }

    /// The global-window mask is at most one contiguous run within the length range.
    #[test]
    fn global_window_is_one_bounded_run((series, min, max) in arb_discord_case()) {
        let cfg = DiscordConfig::new(min, max).with_mask_mode(DiscordMaskMode::GlobalWindow);
        let mask = DiscordDetector::new(cfg).detect(&series).unwrap();

        let runs = mask.runs();
        prop_assert!(runs.len() <= 1);
        if let Some(&(start, end)) = runs.first() {
            prop_assert!((min..=max).contains(&(end - start)));
            prop_assert!(end <= series.len());
        }
    }

    /// Repeated discord searches agree exactly.
    #[test]
    fn discord_search_is_deterministic((series, min, max) in arb_discord_case()) {
        let detector = DiscordDetector::new(DiscordConfig::new(min, max));
        prop_assert_eq!(detector.search(&series).unwrap(), detector.search(&series).unwrap());
    }

    /// The outlier mask always has one entry per observation, missing or not.
    #[test]
    fn outlier_mask_matches_row_count(rows in arb_rows(3, 30, 3), k_seed in 0usize..100) {
        let m = ObservationMatrix::from_rows(&rows).unwrap();
        let k = 1 + k_seed % (rows.len() - 1);
        let report = OutlierDetector::new(OutlierConfig::default().with_k(k)).score(&m, Axis::Rows).unwrap();

        prop_assert_eq!(report.mask.len(), rows.len());
        prop_assert_eq!(report.scores.len(), rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.iter().all(|c| c.is_none()) {
                prop_assert!(!report.mask[i]);
                prop_assert!(report.scores[i].is_none());
            }
        }
    }

    /// A smaller alpha never flags more observations.
    #[test]
    fn smaller_alpha_never_flags_more(rows in arb_rows(8, 40, 2), a in 0.001f64..0.9, b in 0.001f64..0.9) {
        let m = ObservationMatrix::from_rows(&rows).unwrap();
        let (strict, loose) = if a <= b { (a, b) } else { (b, a) };
        let base = OutlierConfig::default().with_k(3);

        let n_strict = flag_count(&m, base.clone().with_alpha(strict));
        let n_loose = flag_count(&m, base.with_alpha(loose));
        prop_assert!(n_strict <= n_loose, "alpha {} flagged {}, alpha {} flagged {}", strict, n_strict, loose, n_loose);
    }

    /// Multiplying every column by the same factor leaves the flags unchanged.
    #[test]
    fn flags_invariant_to_uniform_rescaling(rows in arb_rows(8, 40, 3)) {
        let m = ObservationMatrix::from_rows(&rows).unwrap();
        let scaled = m.map_present(|_, v| v * 4.0);
        let cfg = OutlierConfig::default().with_k(4);

        let detector = OutlierDetector::new(cfg);
        prop_assert_eq!(
            detector.detect(&m, Axis::Rows).unwrap(),
            detector.detect(&scaled, Axis::Rows).unwrap()
        );
    }
}
