// src/models/mod.rs

//! Domain models for the scraper and API.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod category;
mod config;
mod dataset;
mod format;

// Re-export all public types
pub use category::{
    COL_CATEGORY, COL_SUBOPTION, COL_YEAR, Category, CategoryDescriptor, ColumnMapping,
};
pub use config::{ApiToken, AuthConfig, CacheConfig, Config, CrawlerConfig, ServerConfig, SyncConfig};
pub use dataset::{Dataset, Record, Value};
pub use format::{DEFAULT_LIMIT, Page, ResponseFormat};
