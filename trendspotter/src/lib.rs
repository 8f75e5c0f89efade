//! # Trendspotter - Anomaly Detection for Tabular Data
//!
//! Trendspotter is an ensemble anomaly detector for tabular data. It runs a
//! panel of statistical and machine-learning detectors over the numeric
//! columns of a dataset and combines their votes into a single per-row
//! verdict. It leverages DataFusion for query execution, so any table a
//! DataFusion session can see (CSV, NDJSON, Parquet, in-memory batches) can
//! be analyzed.
//!
//! ## Overview
//!
//! Each detector looks at the data from a different angle: robust univariate
//! statistics catch single-column outliers, while multivariate detectors
//! catch rows that are only unusual in combination. No single detector is
//! trusted on its own; a row is anomalous only when a majority of the panel
//! agrees. Detectors that cannot run on a given dataset (not enough rows, no
//! variance, a numerical failure) are reported as skipped rather than
//! failing the run.
//!
//! ## Quick Start
//!
//! ```rust
//! use datafusion::prelude::*;
//! use trendspotter::prelude::*;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! // Register a data file with DataFusion
//! let ctx = SessionContext::new();
//! trendspotter::sources::register_path(&ctx, "events", "data/events.csv").await?;
//!
//! // Run the default detector panel with a fixed seed
//! let runner = DetectionRunner::builder()
//!     .table("events")
//!     .config(DetectionConfig::default().with_seed(42))
//!     .build();
//! let report = runner.run(&ctx).await?;
//!
//! // Inspect the verdict
//! println!("{} anomalous rows", report.anomaly_count());
//! for skipped in &report.skipped {
//!     println!("{} skipped: {}", skipped.name, skipped.reason);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## The Detector Panel
//!
//! The default panel runs five detectors:
//!
//! - **`outlier_zscore`**: per-column z-score against the population mean
//! - **`outlier_iqr`**: per-column interquartile-range fences
//! - **`anomaly_iforest`**: isolation forest over the row vectors
//! - **`anomaly_lof`**: local outlier factor over the row vectors
//! - **`anomaly_cluster_dist`**: distance to the nearest k-means centroid
//!
//! A row is flagged in the final verdict when at least two detectors vote
//! for it. Stochastic detectors take their seed from
//! [`DetectionConfig::with_seed`], so runs are reproducible.
//!
//! ## Failure Isolation
//!
//! Detectors run concurrently on blocking threads, each under an optional
//! timeout. A detector that cannot produce flags — too few rows, constant
//! data, a panic, a timeout — is demoted to the report's `skipped` list with
//! a reason, and the remaining detectors still vote. Only dataset-level
//! problems (the table does not exist, the query fails) abort a run.
//!
//! ## Architecture
//!
//! - **`config`**: detector tuning knobs and validation
//! - **`detectors`**: the detector implementations and the [`detectors::OutlierDetector`] trait
//! - **`ensemble`**: majority voting over detector outcomes
//! - **`frame`**: projection of record batches into a clean numeric matrix
//! - **`runner`**: orchestration, concurrency, and timeouts
//! - **`report`**: the [`report::DetectionReport`] result type
//! - **`sources`**: data source connectors for files
//! - **`summary`**: per-column dataset statistics
//! - **`formatters`**: JSON, human-readable, and Markdown report output

pub mod config;
pub mod detectors;
pub mod ensemble;
pub mod error;
pub mod formatters;
pub mod frame;
pub mod logging;
pub mod prelude;
pub mod report;
pub mod runner;
pub mod sources;
pub mod summary;
