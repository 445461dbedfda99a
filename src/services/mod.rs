//! Service layer.
//!
//! - HTML table and year-range parsing (`table`)
//! - Descriptor-driven extraction (`CategoryExtractor`)
//! - Row normalization (`RowNormalizer`)

mod extractor;
mod normalizer;
pub mod table;

#[cfg(test)]
pub(crate) use extractor::fixtures;
pub use extractor::{CategoryExtractor, Combination, Extraction};
pub use normalizer::{RowNormalizer, parse_quantity};
