// src/lib.rs

//! vitistat: scrape, clean and cache Embrapa viticulture statistics behind an
//! authenticated HTTP API.

pub mod api;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
