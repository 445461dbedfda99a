// src/api/handlers.rs

//! Route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::AppState;
use super::auth::Principal;
use super::error::ApiError;
use crate::error::AppError;
use crate::models::{Category, Page, ResponseFormat};

#[derive(Debug, Serialize)]
pub struct SyncStarted {
    pub status: &'static str,
}

/// `POST /category/{category}/sync`
pub async fn sync_category(
    principal: Principal,
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<(StatusCode, Json<SyncStarted>), ApiError> {
    let category: Category = category.parse()?;
    log::info!("{} requested a {} sync", principal.name, category);

    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::spawn(async move {
        orchestrator.sync(category).await;
    });

    Ok((StatusCode::ACCEPTED, Json(SyncStarted { status: "started" })))
}

/// `GET /category/{category}`
pub async fn get_category(
    _principal: Principal,
    State(state): State<AppState>,
    Path(category): Path<String>,
    query: Result<Query<Page>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Query(page) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let accept = headers
        .get(ACCEPT)
        .map(|v| {
            v.to_str()
                .map_err(|_| AppError::UnacceptableFormat(String::from_utf8_lossy(v.as_bytes()).into_owned()))
        })
        .transpose()?;
    let format = ResponseFormat::negotiate(accept)?;

    let payload = state.reader.read(&category, format, page).await?;
    let body = payload.into_body()?;
    Ok(([(CONTENT_TYPE, format.media_type())], body).into_response())
}
