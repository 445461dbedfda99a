// src/pipeline/schedule.rs

//! Periodic background sync.

use std::sync::Arc;
use std::time::Duration;

use super::sync::{SyncOrchestrator, SyncReport};

/// Sync all categories once and log a one-line summary.
pub async fn run_cycle(orchestrator: &SyncOrchestrator) -> Vec<SyncReport> {
    let reports = orchestrator.sync_all().await;
    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| !r.success())
        .map(|r| r.category.as_str())
        .collect();

    if failed.is_empty() {
        log::info!("Sync cycle complete: {} categories", reports.len());
    } else {
        log::warn!(
            "Sync cycle complete with {} failure(s): {}",
            failed.len(),
            failed.join(", ")
        );
    }
    reports
}

/// Run sync cycles forever, sleeping `interval` after each one.
///
/// A failed cycle never stops the loop; the next one starts on schedule.
pub async fn run_periodic(orchestrator: Arc<SyncOrchestrator>, interval: Duration) {
    log::info!("Periodic sync every {}s", interval.as_secs());
    loop {
        run_cycle(&orchestrator).await;
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sync::fixtures::{extractor, upstream};
    use crate::services::fixtures::FixtureSource;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cycle_visits_every_category_in_order() {
        let tmp = TempDir::new().unwrap();
        let orchestrator = SyncOrchestrator::new(
            extractor(Arc::new(upstream())),
            Arc::new(LocalStorage::new(tmp.path())),
        );

        let reports = run_cycle(&orchestrator).await;

        let visited: Vec<_> = reports.iter().map(|r| r.category).collect();
        assert_eq!(visited, crate::models::Category::ALL.to_vec());
        assert!(reports.iter().all(SyncReport::success));
    }

    #[tokio::test]
    async fn test_cycle_survives_upstream_outage() {
        let tmp = TempDir::new().unwrap();
        let orchestrator = SyncOrchestrator::new(
            extractor(Arc::new(FixtureSource::new())),
            Arc::new(LocalStorage::new(tmp.path())),
        );

        let reports = run_cycle(&orchestrator).await;

        assert_eq!(reports.len(), 5);
        assert!(reports.iter().all(|r| !r.success()));
    }

    #[tokio::test]
    async fn test_periodic_keeps_running() {
        let tmp = TempDir::new().unwrap();
        let orchestrator = Arc::new(SyncOrchestrator::new(
            extractor(Arc::new(FixtureSource::new())),
            Arc::new(LocalStorage::new(tmp.path())),
        ));

        let handle = tokio::spawn(run_periodic(orchestrator, Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!handle.is_finished());
        handle.abort();
    }
}
