//! CSV file data source.

use async_trait::async_trait;
use datafusion::prelude::{CsvReadOptions, SessionContext};
use tracing::debug;

use crate::error::{Result, SpotterError};
use crate::sources::DataSource;

/// Options for reading CSV files.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the first row is a header. Defaults to `true`.
    pub has_header: bool,
    /// Field delimiter. Defaults to `b','`.
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
        }
    }
}

/// A CSV file registered as a queryable table.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: String,
    options: CsvOptions,
}

impl CsvSource {
    /// Creates a CSV source with default options.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            options: CsvOptions::default(),
        }
    }

    /// Creates a CSV source with explicit options.
    pub fn with_options(path: impl Into<String>, options: CsvOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }
}

#[async_trait]
impl DataSource for CsvSource {
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()> {
        let options = CsvReadOptions::new()
            .has_header(self.options.has_header)
            .delimiter(self.options.delimiter);
        ctx.register_csv(table_name, &self.path, options)
            .await
            .map_err(|e| SpotterError::data_source("csv", e.to_string()))?;
        debug!(path = %self.path, table = table_name, "registered CSV source");
        Ok(())
    }

    fn description(&self) -> String {
        format!("CSV file at {}", self.path)
    }
}
