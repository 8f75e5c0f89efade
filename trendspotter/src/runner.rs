//! Orchestration of the detector ensemble over a registered table.

use std::sync::Arc;
use std::time::{Duration, Instant};

use datafusion::prelude::*;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::DetectionConfig;
use crate::detectors::{default_registry, DetectorOutcome, OutlierDetector, Unavailable};
use crate::ensemble::{aggregate, DetectorRun};
use crate::error::Result;
use crate::frame::NumericFrame;
use crate::report::DetectionReport;

/// Table name the runner analyzes unless told otherwise.
pub const DEFAULT_TABLE: &str = "data";

/// Runs every registered detector over a table and aggregates the votes.
///
/// Detector execution is isolated: an unavailable, panicking, or timed-out
/// detector is excluded from the vote while the rest proceed. The runner
/// itself fails only on environment faults such as a missing table.
///
/// # Example
///
/// ```rust,no_run
/// use datafusion::prelude::*;
/// use trendspotter::runner::DetectionRunner;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = SessionContext::new();
/// ctx.register_csv("data", "events.csv", CsvReadOptions::new()).await?;
///
/// let report = DetectionRunner::new().run(&ctx).await?;
/// println!(
///     "{} of {} rows anomalous",
///     report.anomaly_count(),
///     report.row_count
/// );
/// # Ok(())
/// # }
/// ```
pub struct DetectionRunner {
    table: String,
    config: DetectionConfig,
    detectors: Vec<Arc<dyn OutlierDetector>>,
}

impl Default for DetectionRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionRunner {
    /// Creates a runner with the default configuration and detector set,
    /// analyzing the [`DEFAULT_TABLE`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a runner.
    pub fn builder() -> DetectionRunnerBuilder {
        DetectionRunnerBuilder::new()
    }

    /// The table this runner analyzes.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of detectors registered.
    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Collects the table and runs the full ensemble.
    ///
    /// An empty table short-circuits to an empty report. Detectors run
    /// concurrently on the blocking thread pool and share one read-only
    /// numeric view.
    #[instrument(skip(self, ctx), fields(table = %self.table, detector_count = self.detectors.len()))]
    pub async fn run(&self, ctx: &SessionContext) -> Result<DetectionReport> {
        self.config.validate()?;
        let started = Instant::now();

        let dataframe = ctx.table(self.table.as_str()).await?;
        let batches = dataframe.collect().await?;
        let row_count: usize = batches.iter().map(|batch| batch.num_rows()).sum();
        info!(rows = row_count, "starting anomaly detection");

        if row_count == 0 {
            info!("dataset is empty, returning empty report");
            let mut report = DetectionReport::empty(self.table.clone());
            report.elapsed_ms = started.elapsed().as_millis() as u64;
            return Ok(report);
        }

        let frame = Arc::new(NumericFrame::from_batches(&batches)?);
        debug!(
            numeric_columns = frame.column_count(),
            "built sanitized numeric view"
        );

        let timeout = self.config.detector_timeout_ms.map(Duration::from_millis);
        let mut handles: Vec<(String, JoinHandle<DetectorOutcome>)> =
            Vec::with_capacity(self.detectors.len());
        for detector in &self.detectors {
            let name = detector.name().to_string();
            let detector = Arc::clone(detector);
            let frame = Arc::clone(&frame);
            let handle = tokio::task::spawn_blocking(move || detector.detect(&frame));
            handles.push((name, handle));
        }

        let joins = handles.into_iter().map(|(name, handle)| async move {
            let outcome = await_detector(handle, timeout).await;
            (name, outcome)
        });
        let outcomes = futures::future::join_all(joins).await;

        let mut runs = Vec::with_capacity(outcomes.len());
        for (name, outcome) in outcomes {
            match &outcome {
                Ok(flags) => debug!(
                    detector = %name,
                    flagged = flags.iter().filter(|flag| **flag).count(),
                    "detector finished"
                ),
                Err(reason) => warn!(detector = %name, %reason, "detector excluded"),
            }
            runs.push(DetectorRun::new(name, outcome));
        }

        let mut report = aggregate(self.table.clone(), row_count, runs);
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            anomalies = report.anomaly_count(),
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed_ms,
            "detection run complete"
        );
        Ok(report)
    }
}

/// Joins a detector task, mapping panics and timeouts to [`Unavailable`].
async fn await_detector(
    handle: JoinHandle<DetectorOutcome>,
    timeout: Option<Duration>,
) -> DetectorOutcome {
    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                // A blocking task cannot be interrupted; it finishes in the
                // background and its result is dropped.
                return Err(Unavailable::TimedOut);
            }
        },
        None => handle.await,
    };
    match joined {
        Ok(outcome) => outcome,
        Err(join_error) => Err(Unavailable::Crashed(join_error.to_string())),
    }
}

/// Builder for [`DetectionRunner`].
pub struct DetectionRunnerBuilder {
    table: String,
    config: DetectionConfig,
    registry: Option<Vec<Arc<dyn OutlierDetector>>>,
    extra: Vec<Arc<dyn OutlierDetector>>,
}

impl Default for DetectionRunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionRunnerBuilder {
    /// Creates a builder with defaults.
    pub fn new() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            config: DetectionConfig::default(),
            registry: None,
            extra: Vec::new(),
        }
    }

    /// Sets the table to analyze.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the detection configuration.
    pub fn config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default detector registry entirely.
    pub fn detectors(mut self, detectors: Vec<Arc<dyn OutlierDetector>>) -> Self {
        self.registry = Some(detectors);
        self
    }

    /// Appends a detector to the registry.
    pub fn add_detector(mut self, detector: Arc<dyn OutlierDetector>) -> Self {
        self.extra.push(detector);
        self
    }

    /// Builds the runner. Detector construction uses the configured
    /// thresholds and seed unless the registry was replaced.
    pub fn build(self) -> DetectionRunner {
        let mut detectors = self
            .registry
            .unwrap_or_else(|| default_registry(&self.config));
        detectors.extend(self.extra);
        DetectionRunner {
            table: self.table,
            config: self.config,
            detectors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::ZScoreDetector;
    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;

    fn numeric_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Float64, false),
            Field::new("b", DataType::Float64, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])),
                Arc::new(Float64Array::from(vec![10.0, 20.0, 30.0])),
            ],
        )
        .unwrap()
    }

    async fn context_with(batch: RecordBatch) -> SessionContext {
        let ctx = SessionContext::new();
        ctx.register_batch(DEFAULT_TABLE, batch).unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_every_registered_detector_is_accounted_for() {
        let ctx = context_with(numeric_batch()).await;
        let runner = DetectionRunner::new();
        assert_eq!(runner.detector_count(), 5);

        let report = runner.run(&ctx).await.unwrap();
        assert_eq!(report.row_count, 3);
        assert_eq!(report.detectors.len() + report.skipped.len(), 5);
        assert_eq!(report.votes.len(), 3);
        assert_eq!(report.anomaly_any.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_table_returns_empty_report() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "a",
            DataType::Float64,
            false,
        )]));
        let ctx = context_with(RecordBatch::new_empty(schema)).await;

        let report = DetectionRunner::new().run(&ctx).await.unwrap();
        assert_eq!(report.row_count, 0);
        assert!(report.detectors.is_empty());
        assert!(report.skipped.is_empty());
        assert!(report.anomaly_any.is_empty());
    }

    #[tokio::test]
    async fn test_missing_table_is_an_error() {
        let ctx = SessionContext::new();
        let result = DetectionRunner::new().run(&ctx).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_querying() {
        let ctx = SessionContext::new();
        let runner = DetectionRunner::builder()
            .config(DetectionConfig::default().with_z_threshold(-1.0))
            .build();
        // No table is registered: a config error must win over the query.
        let error = runner.run(&ctx).await.unwrap_err();
        assert!(error.to_string().contains("z_threshold"));
    }

    #[tokio::test]
    async fn test_non_numeric_table_excludes_every_detector() {
        let schema = Arc::new(Schema::new(vec![Field::new("label", DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["a", "b", "c", "d"]))],
        )
        .unwrap();
        let ctx = context_with(batch).await;

        let report = DetectionRunner::new().run(&ctx).await.unwrap();
        assert!(report.detectors.is_empty());
        assert_eq!(report.skipped.len(), 5);
        assert_eq!(report.anomaly_any, vec![false; 4]);
        assert!(report.is_degraded());
    }

    #[tokio::test]
    async fn test_builder_replaces_registry() {
        let ctx = context_with(numeric_batch()).await;
        let runner = DetectionRunner::builder()
            .detectors(vec![Arc::new(ZScoreDetector::default())])
            .build();
        assert_eq!(runner.detector_count(), 1);

        let report = runner.run(&ctx).await.unwrap();
        assert_eq!(report.detector_names(), vec!["outlier_zscore"]);
    }

    #[tokio::test]
    async fn test_builder_custom_table_name() {
        let ctx = SessionContext::new();
        ctx.register_batch("events", numeric_batch()).unwrap();

        let runner = DetectionRunner::builder().table("events").build();
        let report = runner.run(&ctx).await.unwrap();
        assert_eq!(report.table, "events");
        assert_eq!(report.row_count, 3);
    }
}
