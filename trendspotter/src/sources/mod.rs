//! Data source connectors for the detection pipeline.
//!
//! File-based sources (CSV, newline-delimited JSON, Parquet) that register
//! a table into a DataFusion session, plus [`register_path`] which picks
//! the source from the file extension.

use std::fmt::Debug;

use async_trait::async_trait;
use datafusion::prelude::SessionContext;

use crate::error::{Result, SpotterError};

mod csv;
mod json;
mod parquet;

pub use csv::{CsvOptions, CsvSource};
pub use json::{JsonOptions, JsonSource};
pub use parquet::ParquetSource;

/// A data source that can be registered with a DataFusion context.
#[async_trait]
pub trait DataSource: Debug + Send + Sync {
    /// Registers this data source under the given table name.
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()>;

    /// Returns a human-readable description of this data source.
    fn description(&self) -> String;
}

/// File formats understood by [`register_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-separated values.
    Csv,
    /// Newline-delimited JSON.
    Json,
    /// Apache Parquet.
    Parquet,
}

impl SourceFormat {
    /// Detects the format from a file path extension, if supported.
    pub fn from_path(path: &str) -> Option<Self> {
        let lower = path.to_lowercase();
        if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else if lower.ends_with(".json") || lower.ends_with(".jsonl") || lower.ends_with(".ndjson")
        {
            Some(Self::Json)
        } else if lower.ends_with(".parquet") {
            Some(Self::Parquet)
        } else {
            None
        }
    }
}

/// Registers a local file, picking the source from its extension.
///
/// # Examples
///
/// ```rust,no_run
/// use datafusion::prelude::SessionContext;
/// use trendspotter::sources::register_path;
///
/// # async fn example() -> trendspotter::error::Result<()> {
/// let ctx = SessionContext::new();
/// register_path(&ctx, "events", "data/events.csv").await?;
/// # Ok(())
/// # }
/// ```
pub async fn register_path(ctx: &SessionContext, table_name: &str, path: &str) -> Result<()> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Csv) => CsvSource::new(path).register(ctx, table_name).await,
        Some(SourceFormat::Json) => JsonSource::new(path).register(ctx, table_name).await,
        Some(SourceFormat::Parquet) => ParquetSource::new(path).register(ctx, table_name).await,
        None => Err(SpotterError::data_source(
            "file",
            format!("unsupported file extension: {path}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_path("data.csv"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_path("DATA.CSV"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_path("rows.json"), Some(SourceFormat::Json));
        assert_eq!(SourceFormat::from_path("rows.jsonl"), Some(SourceFormat::Json));
        assert_eq!(
            SourceFormat::from_path("rows.ndjson"),
            Some(SourceFormat::Json)
        );
        assert_eq!(
            SourceFormat::from_path("table.parquet"),
            Some(SourceFormat::Parquet)
        );
        assert_eq!(SourceFormat::from_path("notes.txt"), None);
        assert_eq!(SourceFormat::from_path("archive.csv.gz"), None);
    }

    #[tokio::test]
    async fn test_register_path_rejects_unknown_extension() {
        let ctx = SessionContext::new();
        let result = register_path(&ctx, "data", "notes.txt").await;
        assert!(result.is_err());
    }
}
