//! Authenticated HTTP API.
//!
//! - `POST /category/{category}/sync`: start a background sync (`202`)
//! - `GET /category/{category}`: cached data as JSON or CSV

pub mod auth;
pub mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::{CacheReader, SyncOrchestrator, run_periodic};

pub use auth::{Authenticator, Principal, StaticTokenAuthenticator};
pub use error::ApiError;

/// Shared state of every request.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub reader: CacheReader,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, authenticator: Arc<dyn Authenticator>) -> Self {
        let reader = CacheReader::new(orchestrator.storage());
        Self {
            orchestrator,
            reader,
            authenticator,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/category/{category}", get(handlers::get_category))
        .route("/category/{category}/sync", post(handlers::sync_category))
        .with_state(state)
}

/// Serve the API and, if enabled, the periodic sync until the listener fails.
pub async fn serve(config: &Config) -> Result<()> {
    let orchestrator = Arc::new(SyncOrchestrator::from_config(config)?);
    if config.sync.enabled {
        tokio::spawn(run_periodic(Arc::clone(&orchestrator), config.sync.interval()));
    } else {
        log::info!("Periodic sync disabled");
    }

    let authenticator = StaticTokenAuthenticator::from_config(&config.auth);
    if authenticator.is_empty() {
        log::warn!("No API tokens configured; every request will be rejected");
    }
    let state = AppState::new(orchestrator, Arc::new(authenticator));

    let listener = tokio::net::TcpListener::bind(config.server.socket_addr()?).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
