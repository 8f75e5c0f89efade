//! Detector strategies for the anomaly ensemble.
//!
//! Every detector implements [`OutlierDetector`]: given the cleaned
//! [`NumericFrame`], it either produces one boolean flag per dataset row or
//! declares itself [`Unavailable`] for this dataset. Unavailability is a
//! value, not an error — a detector that cannot run (no numeric columns, no
//! variance, numerical failure) is simply excluded from the ensemble vote
//! and the remaining detectors carry on.
//!
//! The five built-in detectors, in registry order:
//!
//! | Output column          | Strategy                                  |
//! |------------------------|-------------------------------------------|
//! | `outlier_zscore`       | per-column z-score threshold              |
//! | `outlier_iqr`          | per-column Tukey fences                   |
//! | `anomaly_iforest`      | isolation forest over all numeric columns |
//! | `anomaly_lof`          | local outlier factor (density)            |
//! | `anomaly_cluster_dist` | distance to the nearest k-means centroid  |

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::frame::NumericFrame;

pub mod cluster;
pub mod iforest;
pub mod iqr;
pub mod lof;
pub(crate) mod stats;
pub mod zscore;

pub use cluster::ClusterDistanceDetector;
pub use iforest::IsolationForestDetector;
pub use iqr::IqrDetector;
pub use lof::LofDetector;
pub use zscore::ZScoreDetector;

/// Per-row anomaly flags in dataset order.
pub type RowFlags = Vec<bool>;

/// Outcome of a single detector run.
pub type DetectorOutcome = std::result::Result<RowFlags, Unavailable>;

/// Why a detector produced no flags for this dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Unavailable {
    /// The dataset has no numeric columns.
    NoNumericColumns,
    /// Every numeric column is constant, leaving nothing to fit.
    NoVariance,
    /// The fit failed numerically.
    Numerical(String),
    /// The detector exceeded its wall-clock budget and was abandoned.
    TimedOut,
    /// The detector panicked and was isolated from the run.
    Crashed(String),
    /// The flag vector did not line up with the dataset rows.
    RowCountMismatch {
        /// Rows in the dataset.
        expected: usize,
        /// Flags the detector produced.
        actual: usize,
    },
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoNumericColumns => write!(f, "no numeric columns"),
            Self::NoVariance => write!(f, "no non-constant numeric columns"),
            Self::Numerical(reason) => write!(f, "numerical failure: {reason}"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Crashed(reason) => write!(f, "crashed: {reason}"),
            Self::RowCountMismatch { expected, actual } => {
                write!(f, "produced {actual} flags for {expected} rows")
            }
        }
    }
}

/// An anomaly detection strategy over the numeric view of a dataset.
///
/// Implementations must be deterministic for a given input and
/// configuration (stochastic detectors take an explicit seed) and must
/// never panic on degenerate data — degenerate inputs map to either an
/// all-false flag vector or an [`Unavailable`] outcome.
pub trait OutlierDetector: fmt::Debug + Send + Sync {
    /// Stable name of this detector, used as its output column.
    fn name(&self) -> &str;

    /// One-line description of the strategy.
    fn description(&self) -> &str;

    /// Computes per-row flags over the cleaned numeric view.
    ///
    /// A successful outcome holds exactly `frame.row_count()` flags in
    /// dataset row order.
    fn detect(&self, frame: &NumericFrame) -> DetectorOutcome;
}

/// Input to a multivariate fit after the shared degeneracy checks.
#[derive(Debug)]
pub(crate) enum FitInput {
    /// Too few rows to fit; respond with this many `false` flags.
    Degenerate(usize),
    /// Constant-free view, at least two rows and one column.
    Ready(NumericFrame),
}

/// Applies the degeneracy contract shared by the multivariate detectors.
///
/// Check order matters: the row-count check runs before constant columns
/// are removed, so a single-row dataset degrades to all-false flags rather
/// than becoming unavailable (every column looks constant with one row).
pub(crate) fn reduce_for_fit(frame: &NumericFrame) -> Result<FitInput, Unavailable> {
    if frame.is_empty() {
        return Err(Unavailable::NoNumericColumns);
    }
    if frame.row_count() < 2 {
        return Ok(FitInput::Degenerate(frame.row_count()));
    }
    let reduced = frame.without_constant_columns();
    if reduced.is_empty() {
        return Err(Unavailable::NoVariance);
    }
    Ok(FitInput::Ready(reduced))
}

/// Builds the standard five-detector ensemble from a configuration.
///
/// The order is fixed and is the order detector columns appear in the
/// report. The configured contamination applies to the isolation forest;
/// the density detector keeps its score-based auto cutoff.
pub fn default_registry(config: &DetectionConfig) -> Vec<Arc<dyn OutlierDetector>> {
    vec![
        Arc::new(ZScoreDetector::new(config.z_threshold)),
        Arc::new(IqrDetector::new(config.iqr_factor)),
        Arc::new(IsolationForestDetector::new(
            config.contamination,
            config.seed,
        )),
        Arc::new(LofDetector::new(config.neighbor_count)),
        Arc::new(ClusterDistanceDetector::new(
            config.cluster_count,
            config.distance_percentile,
            config.seed,
        )),
    ]
}
