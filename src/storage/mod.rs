//! Storage abstractions for the dataset cache.
//!
//! One entry per category, written in both wire formats:
//!
//! ```text
//! {cache.dir}/
//! ├── table_exportation.csv
//! ├── table_exportation.json
//! ├── ...
//! └── table_trade.json
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Dataset, ResponseFormat};

// Re-export for convenience
pub use local::LocalStorage;

/// Metadata about a cache write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Rows written to each file
    pub rows: usize,
    /// Keys written, CSV first
    pub keys: Vec<String>,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Key of a cache entry in the given format (`table_trade.csv`, ...).
pub fn entry_key(name: &str, format: ResponseFormat) -> String {
    format!("{}.{}", name, format.extension())
}

/// Render a dataset as CSV: header row, no index column.
pub fn encode_csv(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&dataset.columns)?;
    for row in &dataset.rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

/// Render a dataset as a JSON array of objects, keys in column order.
pub fn encode_json(dataset: &Dataset) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(dataset)?)
}

/// Trait for cache backends.
#[async_trait]
pub trait DatasetStorage: Send + Sync {
    /// Replace the CSV and JSON entries stored under `name`.
    async fn write_dataset(&self, name: &str, dataset: &Dataset) -> Result<WriteMetadata>;

    /// Raw bytes of one entry, or `None` if it was never written.
    async fn read_entry(&self, name: &str, format: ResponseFormat) -> Result<Option<Vec<u8>>>;

    /// Last write time of an entry, or `None` if it was never written.
    async fn modified(&self, name: &str, format: ResponseFormat) -> Result<Option<DateTime<Utc>>>;
}
