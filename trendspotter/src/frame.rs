//! Sanitized numeric view of a dataset.
//!
//! [`NumericFrame`] projects a collected table onto its numeric columns and
//! cleans the values for detector consumption: every column is cast to
//! `f64`, and nulls, NaN, and ±∞ are replaced with `0.0`. The zero fill is a
//! documented simplification rather than an imputation strategy; callers
//! that need smarter treatment of missing values should fill them upstream.
//!
//! The view is built fresh for each detection run and never mutates the
//! source table. Row order is preserved exactly, which is what lets
//! detector outputs line up with the original dataset by position.

use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{Result, SpotterError};

/// A single cleaned numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    name: String,
    values: Vec<f64>,
}

impl NumericColumn {
    /// Column name as it appears in the source schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cleaned values, one per dataset row.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// True if every value equals the first, i.e. the column has zero
    /// deviation. Columns with fewer than two values count as constant.
    pub fn is_constant(&self) -> bool {
        self.values.windows(2).all(|pair| pair[0] == pair[1])
    }
}

/// The numeric projection of a dataset, cleaned and column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericFrame {
    row_count: usize,
    columns: Vec<NumericColumn>,
}

impl NumericFrame {
    /// Builds the cleaned numeric view from collected record batches.
    ///
    /// Columns with a numeric Arrow type (integers, floats, decimals) are
    /// cast to `f64`; everything else is left out of the view. The row
    /// count reflects the full table even when no column is numeric.
    pub fn from_batches(batches: &[RecordBatch]) -> Result<Self> {
        let row_count = batches.iter().map(|batch| batch.num_rows()).sum();
        let Some(first) = batches.first() else {
            return Ok(Self {
                row_count: 0,
                columns: Vec::new(),
            });
        };

        let schema = first.schema();
        let numeric_fields: Vec<usize> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| field.data_type().is_numeric())
            .map(|(index, _)| index)
            .collect();

        let mut columns = Vec::with_capacity(numeric_fields.len());
        for index in numeric_fields {
            let mut values = Vec::with_capacity(row_count);
            for batch in batches {
                let array = cast(batch.column(index), &DataType::Float64)?;
                let array = array
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| {
                        SpotterError::internal("cast to Float64 produced unexpected array type")
                    })?;
                for row in 0..array.len() {
                    let value = if array.is_null(row) {
                        0.0
                    } else {
                        let raw = array.value(row);
                        if raw.is_finite() {
                            raw
                        } else {
                            0.0
                        }
                    };
                    values.push(value);
                }
            }
            columns.push(NumericColumn {
                name: schema.field(index).name().clone(),
                values,
            });
        }

        Ok(Self { row_count, columns })
    }

    /// Builds a view directly from named columns, applying the same
    /// cleaning as [`from_batches`](Self::from_batches).
    ///
    /// All columns must have the same length.
    pub fn from_columns<N>(columns: impl IntoIterator<Item = (N, Vec<f64>)>) -> Result<Self>
    where
        N: Into<String>,
    {
        let mut cleaned: Vec<NumericColumn> = Vec::new();
        let mut row_count = 0usize;
        for (position, (name, mut values)) in columns.into_iter().enumerate() {
            if position == 0 {
                row_count = values.len();
            } else if values.len() != row_count {
                return Err(SpotterError::invalid_config(format!(
                    "column lengths disagree: expected {row_count}, got {}",
                    values.len()
                )));
            }
            for value in values.iter_mut() {
                if !value.is_finite() {
                    *value = 0.0;
                }
            }
            cleaned.push(NumericColumn {
                name: name.into(),
                values,
            });
        }
        Ok(Self {
            row_count,
            columns: cleaned,
        })
    }

    /// Number of rows in the source table.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of numeric columns in the view.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the view holds no numeric columns at all.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The cleaned columns in schema order.
    pub fn columns(&self) -> &[NumericColumn] {
        &self.columns
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name()).collect()
    }

    /// Returns a copy of the view with zero-deviation columns removed.
    ///
    /// This is the input the multivariate detectors fit on; a constant
    /// column carries no distance or density signal and breaks
    /// standardization.
    pub fn without_constant_columns(&self) -> NumericFrame {
        NumericFrame {
            row_count: self.row_count,
            columns: self
                .columns
                .iter()
                .filter(|column| !column.is_constant())
                .cloned()
                .collect(),
        }
    }

    /// Rows as dense points, in dataset order.
    pub fn row_vectors(&self) -> Vec<Vec<f64>> {
        (0..self.row_count)
            .map(|row| self.columns.iter().map(|column| column.values[row]).collect())
            .collect()
    }
}
