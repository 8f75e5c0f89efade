//! Z-score detector: flags values far from their column mean.

use tracing::trace;

use super::stats;
use super::{DetectorOutcome, OutlierDetector, Unavailable};
use crate::frame::NumericFrame;

/// Flags a row when any of its values sits more than `z_threshold`
/// population standard deviations from the column mean.
///
/// Columns with zero deviation contribute no flags: with no spread there
/// is no meaningful distance from the mean, and flagging everything (or
/// nothing, by division blow-up) would only add noise.
#[derive(Debug, Clone)]
pub struct ZScoreDetector {
    z_threshold: f64,
}

impl ZScoreDetector {
    /// Creates a detector with the given z-score threshold.
    pub fn new(z_threshold: f64) -> Self {
        Self { z_threshold }
    }
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl OutlierDetector for ZScoreDetector {
    fn name(&self) -> &str {
        "outlier_zscore"
    }

    fn description(&self) -> &str {
        "flags values more than a fixed number of standard deviations from the column mean"
    }

    fn detect(&self, frame: &NumericFrame) -> DetectorOutcome {
        if frame.is_empty() {
            return Err(Unavailable::NoNumericColumns);
        }

        let mut flags = vec![false; frame.row_count()];
        for column in frame.columns() {
            let center = stats::mean(column.values());
            let deviation = stats::population_std_dev(column.values());
            if deviation == 0.0 {
                trace!(column = column.name(), "zero deviation, column skipped");
                continue;
            }
            for (row, value) in column.values().iter().enumerate() {
                if ((value - center) / deviation).abs() > self.z_threshold {
                    flags[row] = true;
                }
            }
        }
        Ok(flags)
    }
}
