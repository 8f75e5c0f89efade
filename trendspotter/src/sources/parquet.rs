//! Parquet file data source.

use async_trait::async_trait;
use datafusion::prelude::{ParquetReadOptions, SessionContext};
use tracing::debug;

use crate::error::{Result, SpotterError};
use crate::sources::DataSource;

/// A Parquet file registered as a queryable table.
///
/// The schema comes from the file footer, so there are no options to
/// configure beyond the path.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: String,
}

impl ParquetSource {
    /// Creates a Parquet source for the given path.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for ParquetSource {
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()> {
        ctx.register_parquet(table_name, &self.path, ParquetReadOptions::default())
            .await
            .map_err(|e| SpotterError::data_source("parquet", e.to_string()))?;
        debug!(path = %self.path, table = table_name, "registered Parquet source");
        Ok(())
    }

    fn description(&self) -> String {
        format!("Parquet file at {}", self.path)
    }
}
