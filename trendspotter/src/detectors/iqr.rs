//! IQR detector: flags values outside the Tukey fences.

use tracing::trace;

use super::stats;
use super::{DetectorOutcome, OutlierDetector, Unavailable};
use crate::frame::NumericFrame;

/// Flags a row when any of its values falls strictly outside
/// `[Q1 - factor * IQR, Q3 + factor * IQR]` for its column.
///
/// Quartiles use linear interpolation between ranks. Columns whose IQR is
/// zero (at least half the values identical) contribute no flags — the
/// fences collapse onto the quartiles and would flag every deviation from
/// the majority value, however small.
#[derive(Debug, Clone)]
pub struct IqrDetector {
    factor: f64,
}

impl IqrDetector {
    /// Creates a detector with the given fence factor.
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }
}

impl Default for IqrDetector {
    fn default() -> Self {
        Self::new(1.5)
    }
}

impl OutlierDetector for IqrDetector {
    fn name(&self) -> &str {
        "outlier_iqr"
    }

    fn description(&self) -> &str {
        "flags values outside the interquartile fences of their column"
    }

    fn detect(&self, frame: &NumericFrame) -> DetectorOutcome {
        if frame.is_empty() {
            return Err(Unavailable::NoNumericColumns);
        }

        let mut flags = vec![false; frame.row_count()];
        for column in frame.columns() {
            let q1 = stats::percentile(column.values(), 25.0);
            let q3 = stats::percentile(column.values(), 75.0);
            let iqr = q3 - q1;
            if iqr == 0.0 {
                trace!(column = column.name(), "zero interquartile range, column skipped");
                continue;
            }
            let lower = q1 - self.factor * iqr;
            let upper = q3 + self.factor * iqr;
            for (row, value) in column.values().iter().enumerate() {
                if *value < lower || *value > upper {
                    flags[row] = true;
                }
            }
        }
        Ok(flags)
    }
}
