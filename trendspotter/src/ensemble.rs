//! Majority-vote aggregation of detector outcomes.

use chrono::Utc;
use tracing::warn;

use crate::detectors::{DetectorOutcome, Unavailable};
use crate::report::{DetectionReport, DetectorFlags, SkippedDetector};

/// Votes needed before a row is anomalous overall.
///
/// The bar is fixed: when detectors drop out the ensemble tightens rather
/// than loosens, and a single surviving detector can never set
/// `anomaly_any` on its own. [`DetectionReport::is_degraded`] tells
/// callers when that happened.
pub const MAJORITY_VOTES: u32 = 2;

/// Outcome of one detector run, tagged with the detector name.
#[derive(Debug)]
pub struct DetectorRun {
    /// Detector output column name.
    pub name: String,
    /// What the detector produced.
    pub outcome: DetectorOutcome,
}

impl DetectorRun {
    /// Creates a tagged detector outcome.
    pub fn new(name: impl Into<String>, outcome: DetectorOutcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }
}

/// Combines detector outcomes into a [`DetectionReport`].
///
/// Unavailable detectors are recorded and excluded. A successful outcome
/// whose flag count does not match `row_count` would misalign every
/// downstream column, so it is demoted to unavailable rather than
/// trusted. The caller fills in timing afterwards.
pub fn aggregate(
    table: impl Into<String>,
    row_count: usize,
    runs: Vec<DetectorRun>,
) -> DetectionReport {
    let mut detectors = Vec::new();
    let mut skipped = Vec::new();

    for run in runs {
        match run.outcome {
            Ok(flags) if flags.len() == row_count => {
                detectors.push(DetectorFlags {
                    name: run.name,
                    flags,
                });
            }
            Ok(flags) => {
                warn!(
                    detector = %run.name,
                    expected = row_count,
                    actual = flags.len(),
                    "flag vector does not match dataset rows, detector excluded"
                );
                skipped.push(SkippedDetector {
                    name: run.name,
                    reason: Unavailable::RowCountMismatch {
                        expected: row_count,
                        actual: flags.len(),
                    },
                });
            }
            Err(reason) => {
                skipped.push(SkippedDetector {
                    name: run.name,
                    reason,
                });
            }
        }
    }

    let mut votes = vec![0u32; row_count];
    for detector in &detectors {
        for (row, flag) in detector.flags.iter().enumerate() {
            if *flag {
                votes[row] += 1;
            }
        }
    }
    let anomaly_any = votes.iter().map(|count| *count >= MAJORITY_VOTES).collect();

    DetectionReport {
        table: table.into(),
        row_count,
        detectors,
        skipped,
        votes,
        anomaly_any,
        generated_at: Utc::now(),
        elapsed_ms: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(pattern: &[bool]) -> DetectorOutcome {
        Ok(pattern.to_vec())
    }

    #[test]
    fn test_two_votes_set_the_ensemble_flag() {
        let report = aggregate(
            "data",
            3,
            vec![
                DetectorRun::new("a", flags(&[true, true, false])),
                DetectorRun::new("b", flags(&[false, true, false])),
            ],
        );
        assert_eq!(report.votes, vec![1, 2, 0]);
        assert_eq!(report.anomaly_any, vec![false, true, false]);
    }

    #[test]
    fn test_single_vote_is_never_enough() {
        let report = aggregate("data", 2, vec![DetectorRun::new("a", flags(&[true, true]))]);
        assert_eq!(report.votes, vec![1, 1]);
        assert_eq!(report.anomaly_any, vec![false, false]);
    }

    #[test]
    fn test_unanimous_five_detector_vote() {
        let runs = ["a", "b", "c", "d", "e"]
            .into_iter()
            .map(|name| DetectorRun::new(name, flags(&[true, false])))
            .collect();
        let report = aggregate("data", 2, runs);
        assert_eq!(report.votes, vec![5, 0]);
        assert_eq!(report.anomaly_any, vec![true, false]);
    }

    #[test]
    fn test_no_successful_detectors_yields_all_false() {
        let report = aggregate(
            "data",
            3,
            vec![
                DetectorRun::new("a", Err(Unavailable::NoNumericColumns)),
                DetectorRun::new("b", Err(Unavailable::TimedOut)),
            ],
        );
        assert!(report.detectors.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.votes, vec![0, 0, 0]);
        assert_eq!(report.anomaly_any, vec![false, false, false]);
    }

    #[test]
    fn test_unavailable_detector_does_not_disturb_the_rest() {
        let report = aggregate(
            "data",
            2,
            vec![
                DetectorRun::new("a", flags(&[true, false])),
                DetectorRun::new("broken", Err(Unavailable::Numerical("overflow".into()))),
                DetectorRun::new("b", flags(&[true, false])),
            ],
        );
        assert_eq!(report.detector_names(), vec!["a", "b"]);
        assert_eq!(report.anomaly_any, vec![true, false]);
        assert_eq!(report.skipped[0].name, "broken");
    }

    #[test]
    fn test_length_mismatch_is_demoted_to_skipped() {
        let report = aggregate(
            "data",
            3,
            vec![
                DetectorRun::new("short", flags(&[true])),
                DetectorRun::new("ok", flags(&[false, true, true])),
            ],
        );
        assert_eq!(report.detector_names(), vec!["ok"]);
        assert_eq!(
            report.skipped[0].reason,
            Unavailable::RowCountMismatch {
                expected: 3,
                actual: 1
            }
        );
        // The mismatched flags must not have contributed votes.
        assert_eq!(report.votes, vec![0, 1, 1]);
    }

    #[test]
    fn test_zero_rows_produces_empty_columns() {
        let report = aggregate("data", 0, vec![DetectorRun::new("a", flags(&[]))]);
        assert_eq!(report.row_count, 0);
        assert!(report.votes.is_empty());
        assert!(report.anomaly_any.is_empty());
    }
}
