// src/pipeline/sync.rs

//! Sync orchestration: extract, normalize and cache one category.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Category, Config};
use crate::services::{CategoryExtractor, RowNormalizer};
use crate::storage::{DatasetStorage, LocalStorage};
use crate::utils::http::HttpPageSource;

/// Outcome of one category sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub category: Category,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Rows written to the cache (0 on failure)
    pub rows: usize,
    /// Year/sub-option pages requested
    pub requests: usize,
    /// Pages that failed and were skipped
    pub failed_requests: usize,
    /// When the cache entry was written (`None` on failure)
    pub cached_at: Option<DateTime<Utc>>,
    /// Failure reason; the previous cache entry is left untouched when set
    pub error: Option<String>,
}

impl SyncReport {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Default)]
struct SyncCounts {
    rows: usize,
    requests: usize,
    failed_requests: usize,
    cached_at: Option<DateTime<Utc>>,
}

/// Runs syncs against one upstream and one cache.
///
/// Syncs of the same category are serialized; different categories may run
/// concurrently.
pub struct SyncOrchestrator {
    extractor: CategoryExtractor,
    storage: Arc<dyn DatasetStorage>,
    locks: [Mutex<()>; Category::ALL.len()],
}

impl SyncOrchestrator {
    pub fn new(extractor: CategoryExtractor, storage: Arc<dyn DatasetStorage>) -> Self {
        Self {
            extractor,
            storage,
            locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    /// Live upstream client and local cache directory from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = Arc::new(HttpPageSource::from_config(&config.crawler)?);
        let extractor = CategoryExtractor::new(source, &config.crawler);
        let storage = Arc::new(LocalStorage::new(config.cache.dir.clone()));
        Ok(Self::new(extractor, storage))
    }

    pub fn storage(&self) -> Arc<dyn DatasetStorage> {
        Arc::clone(&self.storage)
    }

    /// Sync one category. Never fails; problems end up in the report.
    pub async fn sync(&self, category: Category) -> SyncReport {
        let _guard = self.locks[category as usize].lock().await;
        let started_at = Utc::now();
        log::info!("Sync started for {category}");

        let mut counts = SyncCounts::default();
        let result = self.run(category, &mut counts).await;
        let finished_at = Utc::now();
        let elapsed = (finished_at - started_at).num_milliseconds();

        let error = match result {
            Ok(()) => {
                log::info!(
                    "Sync finished for {}: {} rows, {}/{} pages failed, {} ms",
                    category,
                    counts.rows,
                    counts.failed_requests,
                    counts.requests,
                    elapsed
                );
                None
            }
            Err(e) => {
                log::error!("Sync failed for {category} after {elapsed} ms: {e}");
                counts.rows = 0;
                counts.cached_at = None;
                Some(e.to_string())
            }
        };

        SyncReport {
            category,
            started_at,
            finished_at,
            rows: counts.rows,
            requests: counts.requests,
            failed_requests: counts.failed_requests,
            cached_at: counts.cached_at,
            error,
        }
    }

    /// Sync every category, one after another.
    pub async fn sync_all(&self) -> Vec<SyncReport> {
        let mut reports = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            reports.push(self.sync(category).await);
        }
        reports
    }

    async fn run(&self, category: Category, counts: &mut SyncCounts) -> Result<()> {
        let extraction = self.extractor.extract(category).await?;
        counts.requests = extraction.attempted;
        counts.failed_requests = extraction.failed;
        if extraction.table.is_empty() {
            return Err(AppError::EmptyExtraction(category.to_string()));
        }

        let normalized = RowNormalizer::new(category).normalize(extraction.table)?;
        // Keep the previous entry when nothing survives normalization.
        if normalized.is_empty() {
            return Err(AppError::EmptyExtraction(category.to_string()));
        }

        let meta = self
            .storage
            .write_dataset(&category.cache_name(), &normalized)
            .await?;
        counts.rows = meta.rows;
        counts.cached_at = Some(meta.timestamp);
        Ok(())
    }
}
