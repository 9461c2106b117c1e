//! Local newline-delimited JSON warehouse.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::{to_ndjson, WarehouseLoader, WriteMode};
use crate::error::{PipelineError, Result};
use crate::models::Row;

/// Writes each table to `<dir>/<table>.ndjson`.
#[derive(Debug, Clone)]
pub struct NdjsonLoader {
    dir: PathBuf,
}

impl NdjsonLoader {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// File backing `table`.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.ndjson", table))
    }
}

#[async_trait]
impl WarehouseLoader for NdjsonLoader {
    async fn load(&self, rows: &[Row], table: &str, mode: WriteMode) -> Result<usize> {
        let path = self.table_path(table);
        let body = to_ndjson(rows)?;

        let io_err = |e: std::io::Error| {
            PipelineError::LoadError(format!("cannot write {}: {}", path.display(), e))
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;

        let mut file = match mode {
            WriteMode::Overwrite => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path),
            WriteMode::Append => OpenOptions::new().append(true).create(true).open(&path),
        }
        .map_err(io_err)?;

        file.write_all(body.as_bytes()).map_err(io_err)?;

        info!("Wrote {} rows to {} ({})", rows.len(), path.display(), mode);
        Ok(rows.len())
    }
}
