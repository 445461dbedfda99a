// src/error.rs

//! Unified error handling for the scraper and API.

use std::fmt;

use thiserror::Error;

/// Result type alias for vitistat operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization/deserialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Category outside the five known ones
    #[error("Category '{0}' is not supported.")]
    UnsupportedCategory(String),

    /// Upstream site unreachable or its page could not be parsed
    #[error("Upstream unavailable for {context}: {message}")]
    UpstreamUnavailable { context: String, message: String },

    /// Every year/sub-option fetch of a category failed
    #[error("No rows extracted for '{0}'")]
    EmptyExtraction(String),

    /// Raw table could not be brought into the cached shape
    #[error("Normalization failed for '{category}': {message}")]
    Normalization { category: String, message: String },

    /// Category is valid but has never been synced
    #[error("No cached data for '{0}'. Trigger a sync first.")]
    CacheMiss(String),

    /// Requested media type is neither CSV nor JSON
    #[error("Unsupported response type '{0}'. Use 'application/json' or 'text/csv'.")]
    UnacceptableFormat(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an upstream error with context.
    pub fn upstream(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::UpstreamUnavailable {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a normalization error for a category.
    pub fn normalization(category: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Normalization {
            category: category.into(),
            message: message.to_string(),
        }
    }
}
