//! Warehouse loaders.
//!
//! A [`WarehouseLoader`] writes a validated row collection to one table.
//! [`BigQueryLoader`] submits BigQuery load jobs; [`NdjsonLoader`] writes
//! newline-delimited JSON files for local runs.

pub mod bigquery;
pub mod ndjson;

use std::fmt;

use async_trait::async_trait;

use crate::error::{PipelineError, Result};
use crate::models::Row;

pub use bigquery::BigQueryLoader;
pub use ndjson::NdjsonLoader;

/// How a load treats rows already in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate the table, then write.
    Overwrite,
    /// Add rows after the existing ones.
    Append,
}

impl WriteMode {
    /// BigQuery `writeDisposition` value.
    pub fn disposition(&self) -> &'static str {
        match self {
            WriteMode::Overwrite => "WRITE_TRUNCATE",
            WriteMode::Append => "WRITE_APPEND",
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Overwrite => f.write_str("overwrite"),
            WriteMode::Append => f.write_str("append"),
        }
    }
}

/// Destination for validated rows.
///
/// Loads are not retried; any transport or schema failure is a
/// [`PipelineError::LoadError`].
#[async_trait]
pub trait WarehouseLoader: Send + Sync {
    /// Write `rows` to `table` and return the number of rows written.
    async fn load(&self, rows: &[Row], table: &str, mode: WriteMode) -> Result<usize>;
}

#[async_trait]
impl<T: WarehouseLoader + ?Sized> WarehouseLoader for Box<T> {
    async fn load(&self, rows: &[Row], table: &str, mode: WriteMode) -> Result<usize> {
        (**self).load(rows, table, mode).await
    }
}

/// Serialize rows as newline-delimited JSON, one object per line.
pub fn to_ndjson(rows: &[Row]) -> Result<String> {
    let mut out = String::new();
    for row in rows {
        let line = serde_json::to_string(row)
            .map_err(|e| PipelineError::LoadError(format!("cannot serialize row: {}", e)))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}
