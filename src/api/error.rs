// src/api/error.rs

//! HTTP mapping of application errors.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::AppError;

/// Error returned by handlers and extractors; rendered as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or rejected bearer token
    Unauthorized,
    /// Malformed query string
    BadRequest(String),
    App(AppError),
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError::App(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::App(e) => match e {
                AppError::UnsupportedCategory(_) | AppError::CacheMiss(_) => StatusCode::NOT_FOUND,
                AppError::UnacceptableFormat(_) => StatusCode::NOT_ACCEPTABLE,
                AppError::Validation(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Unauthorized => "Could not validate credentials".to_string(),
            ApiError::BadRequest(message) => message.clone(),
            ApiError::App(e) if self.status().is_server_error() => {
                log::error!("Request failed: {e}");
                "Internal server error".to_string()
            }
            ApiError::App(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "detail": self.detail() }));
        let mut response = (status, body).into_response();
        if let ApiError::Unauthorized = self {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
