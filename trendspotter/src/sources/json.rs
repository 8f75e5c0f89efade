//! Newline-delimited JSON file data source.

use std::sync::Arc;

use arrow::datatypes::Schema;
use async_trait::async_trait;
use datafusion::prelude::{NdJsonReadOptions, SessionContext};
use tracing::debug;

use crate::error::{Result, SpotterError};
use crate::sources::DataSource;

/// Options for reading newline-delimited JSON files.
#[derive(Debug, Clone)]
pub struct JsonOptions {
    /// Schema to use. Inferred from the file when `None`.
    pub schema: Option<Arc<Schema>>,
    /// Maximum records to read for schema inference. Defaults to 1000.
    pub schema_infer_max_records: usize,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            schema: None,
            schema_infer_max_records: 1000,
        }
    }
}

/// A newline-delimited JSON file registered as a queryable table.
///
/// Files must contain one JSON object per line, whatever the extension
/// (`.json`, `.jsonl`, and `.ndjson` are all accepted).
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: String,
    options: JsonOptions,
}

impl JsonSource {
    /// Creates a JSON source with default options.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            options: JsonOptions::default(),
        }
    }

    /// Creates a JSON source with explicit options.
    pub fn with_options(path: impl Into<String>, options: JsonOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }
}

#[async_trait]
impl DataSource for JsonSource {
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()> {
        let lower = self.path.to_lowercase();
        let extension = if lower.ends_with(".ndjson") {
            ".ndjson"
        } else if lower.ends_with(".jsonl") {
            ".jsonl"
        } else {
            ".json"
        };

        let mut options = NdJsonReadOptions::default();
        options.schema = self.options.schema.as_deref();
        options.schema_infer_max_records = self.options.schema_infer_max_records;
        options.file_extension = extension;

        ctx.register_json(table_name, &self.path, options)
            .await
            .map_err(|e| SpotterError::data_source("json", e.to_string()))?;
        debug!(path = %self.path, table = table_name, "registered JSON source");
        Ok(())
    }

    fn description(&self) -> String {
        format!("NDJSON file at {}", self.path)
    }
}
