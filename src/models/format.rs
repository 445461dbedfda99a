// src/models/format.rs

//! Response formats and pagination for cache reads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default page size when only `offset` is given.
pub const DEFAULT_LIMIT: usize = 100;

/// Wire form of a cache read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Csv,
    Json,
}

impl ResponseFormat {
    /// Pick a format from an `Accept` header value.
    ///
    /// CSV wins when `text/csv` is listed; JSON is used for `application/json`,
    /// `*/*` or a missing/empty header.
    pub fn negotiate(accept: Option<&str>) -> Result<Self, AppError> {
        let accept = accept.unwrap_or("").trim();
        if accept.contains("text/csv") {
            Ok(ResponseFormat::Csv)
        } else if accept.is_empty() || accept.contains("application/json") || accept.contains("*/*")
        {
            Ok(ResponseFormat::Json)
        } else {
            Err(AppError::UnacceptableFormat(accept.to_string()))
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ResponseFormat::Csv => "csv",
            ResponseFormat::Json => "json",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ResponseFormat::Csv => "text/csv; charset=utf-8",
            ResponseFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ResponseFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ResponseFormat::Csv),
            "json" => Ok(ResponseFormat::Json),
            other => Err(AppError::UnacceptableFormat(other.to_string())),
        }
    }
}

/// Optional offset/limit pair from a query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl Page {
    pub fn new(offset: Option<usize>, limit: Option<usize>) -> Self {
        Self { offset, limit }
    }

    /// Row range to serve out of `total`, or `None` for the whole dataset.
    pub fn range(&self, total: usize) -> Option<std::ops::Range<usize>> {
        if self.offset.is_none() && self.limit.is_none() {
            return None;
        }
        let start = self.offset.unwrap_or(0).min(total);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        let end = start.saturating_add(limit).min(total);
        Some(start..end)
    }
}
