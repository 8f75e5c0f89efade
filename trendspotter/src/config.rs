//! Configuration for the detection ensemble.
//!
//! All knobs have documented defaults; a `DetectionConfig` deserialized from
//! an empty JSON object is identical to [`DetectionConfig::default()`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpotterError};

/// Contamination setting for the isolation forest detector.
///
/// On the wire this is either the string `"auto"` or a bare rate in
/// `(0.0, 0.5]`, e.g. `{"contamination": 0.01}` or `{"contamination": "auto"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContaminationRepr", into = "ContaminationRepr")]
pub enum Contamination {
    /// Score-based cutoff without an assumed outlier rate.
    Auto,
    /// Expected fraction of outliers in the data.
    Fixed(f64),
}

impl Contamination {
    /// Returns the fixed rate, if one was configured.
    pub fn rate(&self) -> Option<f64> {
        match self {
            Self::Auto => None,
            Self::Fixed(rate) => Some(*rate),
        }
    }
}

/// Wire representation: a bare number or the keyword `"auto"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ContaminationRepr {
    Rate(f64),
    Keyword(String),
}

impl TryFrom<ContaminationRepr> for Contamination {
    type Error = String;

    fn try_from(repr: ContaminationRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            ContaminationRepr::Rate(rate) => {
                if rate.is_finite() && rate > 0.0 && rate <= 0.5 {
                    Ok(Contamination::Fixed(rate))
                } else {
                    Err(format!(
                        "contamination rate must be in (0.0, 0.5], got {rate}"
                    ))
                }
            }
            ContaminationRepr::Keyword(word) if word.eq_ignore_ascii_case("auto") => {
                Ok(Contamination::Auto)
            }
            ContaminationRepr::Keyword(word) => {
                Err(format!("contamination must be a rate or \"auto\", got {word:?}"))
            }
        }
    }
}

impl From<Contamination> for ContaminationRepr {
    fn from(value: Contamination) -> Self {
        match value {
            Contamination::Auto => ContaminationRepr::Keyword("auto".to_string()),
            Contamination::Fixed(rate) => ContaminationRepr::Rate(rate),
        }
    }
}

/// Tuning knobs for every detector in the ensemble plus the run controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Z-score magnitude above which a value is flagged (default 3.0).
    pub z_threshold: f64,
    /// Multiple of the interquartile range defining the Tukey fences
    /// (default 1.5).
    pub iqr_factor: f64,
    /// Expected outlier fraction for the isolation forest (default 0.01).
    pub contamination: Contamination,
    /// Neighborhood size for the density detector, clamped to `rows - 1`
    /// at fit time (default 20).
    pub neighbor_count: usize,
    /// Cluster count for the distance detector, auto-reduced on small
    /// samples (default 5).
    pub cluster_count: usize,
    /// Percentile of centroid distances above which rows are flagged
    /// (default 95.0).
    pub distance_percentile: f64,
    /// Seed for the stochastic detectors; identical seeds give
    /// bit-identical reports (default 0).
    pub seed: u64,
    /// Wall-clock budget per detector in milliseconds, `None` to disable
    /// (default 30 000).
    pub detector_timeout_ms: Option<u64>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            z_threshold: 3.0,
            iqr_factor: 1.5,
            contamination: Contamination::Fixed(0.01),
            neighbor_count: 20,
            cluster_count: 5,
            distance_percentile: 95.0,
            seed: 0,
            detector_timeout_ms: Some(30_000),
        }
    }
}

impl DetectionConfig {
    /// Sets the z-score threshold.
    pub fn with_z_threshold(mut self, threshold: f64) -> Self {
        self.z_threshold = threshold;
        self
    }

    /// Sets the IQR fence factor.
    pub fn with_iqr_factor(mut self, factor: f64) -> Self {
        self.iqr_factor = factor;
        self
    }

    /// Sets the isolation forest contamination.
    pub fn with_contamination(mut self, contamination: Contamination) -> Self {
        self.contamination = contamination;
        self
    }

    /// Sets the density detector neighborhood size.
    pub fn with_neighbor_count(mut self, count: usize) -> Self {
        self.neighbor_count = count;
        self
    }

    /// Sets the cluster count for the distance detector.
    pub fn with_cluster_count(mut self, count: usize) -> Self {
        self.cluster_count = count;
        self
    }

    /// Sets the centroid-distance percentile cutoff.
    pub fn with_distance_percentile(mut self, percentile: f64) -> Self {
        self.distance_percentile = percentile;
        self
    }

    /// Sets the seed shared by the stochastic detectors.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the per-detector timeout; `None` disables it.
    pub fn with_detector_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.detector_timeout_ms = timeout_ms;
        self
    }

    /// Validates that every knob is within its accepted range.
    ///
    /// Deserialization already rejects malformed contamination values; this
    /// covers configs assembled in code.
    pub fn validate(&self) -> Result<()> {
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(SpotterError::invalid_config(format!(
                "z_threshold must be a positive finite number, got {}",
                self.z_threshold
            )));
        }
        if !self.iqr_factor.is_finite() || self.iqr_factor <= 0.0 {
            return Err(SpotterError::invalid_config(format!(
                "iqr_factor must be a positive finite number, got {}",
                self.iqr_factor
            )));
        }
        if let Some(rate) = self.contamination.rate() {
            if !rate.is_finite() || rate <= 0.0 || rate > 0.5 {
                return Err(SpotterError::invalid_config(format!(
                    "contamination rate must be in (0.0, 0.5], got {rate}"
                )));
            }
        }
        if self.neighbor_count == 0 {
            return Err(SpotterError::invalid_config(
                "neighbor_count must be at least 1",
            ));
        }
        if self.cluster_count < 2 {
            return Err(SpotterError::invalid_config(
                "cluster_count must be at least 2",
            ));
        }
        if !self.distance_percentile.is_finite()
            || self.distance_percentile <= 0.0
            || self.distance_percentile > 100.0
        {
            return Err(SpotterError::invalid_config(format!(
                "distance_percentile must be in (0.0, 100.0], got {}",
                self.distance_percentile
            )));
        }
        if self.detector_timeout_ms == Some(0) {
            return Err(SpotterError::invalid_config(
                "detector_timeout_ms must be positive; use None to disable",
            ));
        }
        Ok(())
    }
}
