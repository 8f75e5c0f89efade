//! Property-based tests for the detector panel.
//!
//! These tests verify invariants that must hold for any input:
//!
//! - Every detector emits exactly one flag per input row, or reports itself
//!   unavailable; it never silently drops or invents rows.
//! - The univariate detectors give the same verdict whether or not constant
//!   columns are present alongside the varying ones.
//! - The majority rule over detector votes matches an independent
//!   recomputation from the raw flag vectors.
//! - A single-row dataset never produces a flag from any detector.
//! - The numeric view replaces non-finite cells with zero and preserves
//!   every other cell bit for bit.

use proptest::prelude::*;

use trendspotter::config::DetectionConfig;
use trendspotter::detectors::{
    default_registry, IqrDetector, OutlierDetector, Unavailable, ZScoreDetector,
};
use trendspotter::ensemble::{aggregate, DetectorRun};
use trendspotter::frame::NumericFrame;

fn finite_matrix() -> impl Strategy<Value = Vec<Vec<f64>>> {
    (1usize..=30, 1usize..=3).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(
            prop::collection::vec(-1.0e6..1.0e6f64, rows..=rows),
            cols..=cols,
        )
    })
}

fn vote_matrix() -> impl Strategy<Value = Vec<Vec<bool>>> {
    (1usize..=6, 0usize..=25).prop_flat_map(|(detectors, rows)| {
        prop::collection::vec(
            prop::collection::vec(any::<bool>(), rows..=rows),
            detectors..=detectors,
        )
    })
}

fn frame_from(matrix: Vec<Vec<f64>>) -> NumericFrame {
    NumericFrame::from_columns(
        matrix
            .into_iter()
            .enumerate()
            .map(|(i, values)| (format!("c{i}"), values)),
    )
    .unwrap()
}

proptest! {
    /// Every detector preserves the row count of its input. A detector may
    /// report itself unavailable on degenerate data (all-constant columns),
    /// but an `Ok` outcome always carries one flag per row.
    #[test]
    fn detectors_emit_one_flag_per_row(matrix in finite_matrix()) {
        let rows = matrix[0].len();
        let frame = frame_from(matrix);

        for detector in default_registry(&DetectionConfig::default()) {
            match detector.detect(&frame) {
                Ok(flags) => prop_assert_eq!(
                    flags.len(),
                    rows,
                    "{} must emit one flag per row",
                    detector.name()
                ),
                Err(reason) => prop_assert!(
                    matches!(reason, Unavailable::NoVariance),
                    "{} unexpectedly unavailable: {}",
                    detector.name(),
                    reason
                ),
            }
        }
    }

    /// Constant columns carry no signal for the univariate detectors, so
    /// adding one must not change their verdict on the varying column.
    #[test]
    fn univariate_verdicts_ignore_constant_columns(
        values in prop::collection::vec(-1.0e3..1.0e3f64, 3..30),
        constant in -50.0..50.0f64,
    ) {
        prop_assume!(values.iter().any(|v| (*v - values[0]).abs() > 1e-9));

        let rows = values.len();
        let with_constant = NumericFrame::from_columns(vec![
            ("varying".to_string(), values.clone()),
            ("fixed".to_string(), vec![constant; rows]),
        ])
        .unwrap();
        let without = NumericFrame::from_columns(vec![("varying".to_string(), values)]).unwrap();

        let zscore = ZScoreDetector::default();
        prop_assert_eq!(
            zscore.detect(&with_constant).unwrap(),
            zscore.detect(&without).unwrap()
        );

        let iqr = IqrDetector::default();
        prop_assert_eq!(
            iqr.detect(&with_constant).unwrap(),
            iqr.detect(&without).unwrap()
        );
    }

    /// The aggregated votes and the final verdict must match an independent
    /// recomputation from the raw flag vectors.
    #[test]
    fn majority_votes_match_recomputation(matrix in vote_matrix()) {
        let rows = matrix.first().map(|flags| flags.len()).unwrap_or(0);
        let runs: Vec<DetectorRun> = matrix
            .iter()
            .enumerate()
            .map(|(i, flags)| DetectorRun::new(format!("detector_{i}"), Ok(flags.clone())))
            .collect();

        let report = aggregate("data", rows, runs);
        prop_assert_eq!(report.votes.len(), rows);
        prop_assert_eq!(report.anomaly_any.len(), rows);

        for row in 0..rows {
            let expected = matrix.iter().filter(|flags| flags[row]).count() as u32;
            prop_assert_eq!(report.votes[row], expected);
            prop_assert_eq!(report.anomaly_any[row], expected >= 2);
        }
    }

    /// One row is not enough evidence for any detector.
    #[test]
    fn single_row_panel_never_flags(row in prop::collection::vec(-1.0e6..1.0e6f64, 1..4)) {
        let frame = NumericFrame::from_columns(
            row.into_iter()
                .enumerate()
                .map(|(i, value)| (format!("c{i}"), vec![value])),
        )
        .unwrap();

        for detector in default_registry(&DetectionConfig::default()) {
            let outcome = detector.detect(&frame);
            prop_assert_eq!(
                outcome,
                Ok(vec![false]),
                "{} must not flag a single row",
                detector.name()
            );
        }
    }

    /// Non-finite cells become zero; every finite cell is preserved exactly.
    #[test]
    fn frame_replaces_non_finite_with_zero(
        cells in prop::collection::vec((-1.0e6..1.0e6f64, any::<bool>()), 1..40),
    ) {
        let raw: Vec<f64> = cells
            .iter()
            .enumerate()
            .map(|(i, (value, poison))| {
                if *poison {
                    match i % 3 {
                        0 => f64::NAN,
                        1 => f64::INFINITY,
                        _ => f64::NEG_INFINITY,
                    }
                } else {
                    *value
                }
            })
            .collect();

        let frame = NumericFrame::from_columns(vec![("c".to_string(), raw)]).unwrap();
        let values = frame.columns()[0].values();
        prop_assert_eq!(values.len(), cells.len());

        for (i, (value, poison)) in cells.iter().enumerate() {
            if *poison {
                prop_assert_eq!(values[i], 0.0);
            } else {
                prop_assert_eq!(values[i], *value);
            }
        }
    }
}
