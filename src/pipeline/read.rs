// src/pipeline/read.rs

//! Cache reads with optional pagination.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Category, Page, ResponseFormat};
use crate::storage::DatasetStorage;

/// A cache read, already in its wire format.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// CSV text including the header row
    Csv(String),
    /// JSON array of records
    Json(Vec<serde_json::Value>),
}

impl Payload {
    /// Serialize to the response body.
    pub fn into_body(self) -> Result<String> {
        match self {
            Payload::Csv(text) => Ok(text),
            Payload::Json(records) => Ok(serde_json::to_string(&records)?),
        }
    }
}

/// Serves cached datasets.
#[derive(Clone)]
pub struct CacheReader {
    storage: Arc<dyn DatasetStorage>,
}

impl CacheReader {
    pub fn new(storage: Arc<dyn DatasetStorage>) -> Self {
        Self { storage }
    }

    /// Read `category` in `format`, sliced by `page` if it sets offset or limit.
    pub async fn read(&self, category: &str, format: ResponseFormat, page: Page) -> Result<Payload> {
        let category: Category = category.parse()?;
        let bytes = self
            .storage
            .read_entry(&category.cache_name(), format)
            .await?
            .ok_or_else(|| AppError::CacheMiss(category.to_string()))?;

        match format {
            ResponseFormat::Csv => paginate_csv(&bytes, page).map(Payload::Csv),
            ResponseFormat::Json => paginate_json(&bytes, page).map(Payload::Json),
        }
    }
}

fn paginate_csv(bytes: &[u8], page: Page) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);
    let header = reader.headers()?.clone();
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    let selected = match page.range(records.len()) {
        Some(range) => &records[range],
        None => &records[..],
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;
    for record in selected {
        writer.write_record(record)?;
    }
    let out = writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn paginate_json(bytes: &[u8], page: Page) -> Result<Vec<serde_json::Value>> {
    let mut records: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    if let Some(range) = page.range(records.len()) {
        records.truncate(range.end);
        records.drain(..range.start);
    }
    Ok(records)
}
