//! Dataset-level summary statistics.
//!
//! [`DatasetSummary`] gives a quick per-column overview of the data a
//! detection run will see: null counts, non-finite counts, and basic
//! statistics over the finite values of numeric columns. It is computed
//! from the same record batches the detectors consume.

use std::fmt;

use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::detectors::stats;
use crate::error::{Result, SpotterError};

/// Basic statistics over the finite values of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Summary of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: String,
    pub null_count: usize,
    /// NaN and infinite values among the non-null entries. Always zero for
    /// non-numeric columns.
    pub non_finite_count: usize,
    /// Present for numeric columns with at least one finite value.
    pub numeric: Option<NumericSummary>,
}

/// Per-column overview of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub table: String,
    pub row_count: usize,
    pub columns: Vec<ColumnSummary>,
}

impl DatasetSummary {
    /// Computes a summary from collected record batches.
    pub fn from_batches(table: impl Into<String>, batches: &[RecordBatch]) -> Result<Self> {
        let table = table.into();
        let row_count: usize = batches.iter().map(|b| b.num_rows()).sum();
        let Some(first) = batches.first() else {
            return Ok(Self {
                table,
                row_count,
                columns: Vec::new(),
            });
        };

        let schema = first.schema();
        let mut columns = Vec::with_capacity(schema.fields().len());
        for (index, field) in schema.fields().iter().enumerate() {
            let is_numeric = field.data_type().is_numeric();
            let mut null_count = 0usize;
            let mut non_finite_count = 0usize;
            let mut finite = Vec::new();

            for batch in batches {
                let array = batch.column(index);
                null_count += array.null_count();
                if !is_numeric {
                    continue;
                }
                let casted = cast(array, &DataType::Float64)?;
                let floats = casted
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| {
                        SpotterError::internal(format!(
                            "cast of column '{}' did not produce Float64",
                            field.name()
                        ))
                    })?;
                for i in 0..floats.len() {
                    if floats.is_null(i) {
                        continue;
                    }
                    let value = floats.value(i);
                    if value.is_finite() {
                        finite.push(value);
                    } else {
                        non_finite_count += 1;
                    }
                }
            }

            let numeric = if is_numeric && !finite.is_empty() {
                Some(NumericSummary {
                    mean: stats::mean(&finite),
                    std_dev: stats::population_std_dev(&finite),
                    min: finite.iter().copied().fold(f64::INFINITY, f64::min),
                    max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                })
            } else {
                None
            };

            columns.push(ColumnSummary {
                name: field.name().clone(),
                data_type: field.data_type().to_string(),
                null_count,
                non_finite_count,
                numeric,
            });
        }

        Ok(Self {
            table,
            row_count,
            columns,
        })
    }

    /// Number of columns with at least one numeric value observed.
    pub fn numeric_column_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.numeric.is_some() || c.non_finite_count > 0)
            .count()
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Dataset '{}': {} rows, {} columns",
            self.table,
            self.row_count,
            self.columns.len()
        )?;
        for col in &self.columns {
            write!(
                f,
                "  {} ({}): {} nulls",
                col.name, col.data_type, col.null_count
            )?;
            if col.non_finite_count > 0 {
                write!(f, ", {} non-finite", col.non_finite_count)?;
            }
            if let Some(stats) = &col.numeric {
                write!(
                    f,
                    ", mean {:.4}, deviation {:.4}, range [{:.4}, {:.4}]",
                    stats.mean, stats.std_dev, stats.min, stats.max
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
