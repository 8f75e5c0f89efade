//! Detection report: the combined output of an ensemble run.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detectors::{RowFlags, Unavailable};
use crate::error::Result;

/// Flags produced by one successful detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorFlags {
    /// Detector output column name.
    pub name: String,
    /// One flag per dataset row, in dataset order.
    pub flags: RowFlags,
}

/// A detector excluded from the vote, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDetector {
    /// Detector output column name.
    pub name: String,
    /// Why the detector produced no usable flags.
    pub reason: Unavailable,
}

/// Combined result of a detection run.
///
/// `detectors` holds only the detectors that produced flags, in registry
/// order; everything else is listed in `skipped`. `votes` and
/// `anomaly_any` always cover every dataset row, even when no detector
/// survived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Name of the analyzed table.
    pub table: String,
    /// Rows in the analyzed dataset.
    pub row_count: usize,
    /// Per-detector flag columns.
    pub detectors: Vec<DetectorFlags>,
    /// Detectors that sat this run out.
    pub skipped: Vec<SkippedDetector>,
    /// Per-row count of detectors that flagged the row.
    pub votes: Vec<u32>,
    /// Per-row ensemble verdict.
    pub anomaly_any: Vec<bool>,
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl DetectionReport {
    /// An empty report for a dataset with no rows.
    pub fn empty(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row_count: 0,
            detectors: Vec::new(),
            skipped: Vec::new(),
            votes: Vec::new(),
            anomaly_any: Vec::new(),
            generated_at: Utc::now(),
            elapsed_ms: 0,
        }
    }

    /// Number of rows the ensemble called anomalous.
    pub fn anomaly_count(&self) -> usize {
        self.anomaly_any.iter().filter(|flag| **flag).count()
    }

    /// Share of anomalous rows, in percent. Zero for an empty dataset.
    pub fn anomaly_percentage(&self) -> f64 {
        if self.row_count == 0 {
            0.0
        } else {
            self.anomaly_count() as f64 * 100.0 / self.row_count as f64
        }
    }

    /// Names of the detectors that contributed flags.
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors
            .iter()
            .map(|detector| detector.name.as_str())
            .collect()
    }

    /// Flags for a detector by name, if it succeeded.
    pub fn flags(&self, name: &str) -> Option<&[bool]> {
        self.detectors
            .iter()
            .find(|detector| detector.name == name)
            .map(|detector| detector.flags.as_slice())
    }

    /// True when at least one detector was excluded from the vote.
    pub fn is_degraded(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Exports the flag columns, votes, and ensemble verdict as a record
    /// batch, one row per dataset row.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(self.detectors.len() + 2);
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(self.detectors.len() + 2);

        for detector in &self.detectors {
            fields.push(Field::new(&detector.name, DataType::Boolean, false));
            columns.push(Arc::new(BooleanArray::from(detector.flags.clone())));
        }
        fields.push(Field::new("votes", DataType::UInt32, false));
        columns.push(Arc::new(UInt32Array::from(self.votes.clone())));
        fields.push(Field::new("anomaly_any", DataType::Boolean, false));
        columns.push(Arc::new(BooleanArray::from(self.anomaly_any.clone())));

        let schema = Arc::new(Schema::new(fields));
        Ok(RecordBatch::try_new(schema, columns)?)
    }
}
