//! Prelude for commonly used types and traits in trendspotter.

pub use crate::config::{Contamination, DetectionConfig};
pub use crate::detectors::{DetectorOutcome, OutlierDetector, RowFlags, Unavailable};
pub use crate::error::{Result, SpotterError};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::logging::LoggingConfig;
pub use crate::report::DetectionReport;
pub use crate::runner::DetectionRunner;
