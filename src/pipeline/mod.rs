//! Pipeline entry points.
//!
//! - `SyncOrchestrator`: extract, normalize and cache one category
//! - `run_periodic`: background sync of every category on an interval
//! - `CacheReader`: paginated reads of cached datasets

pub mod read;
pub mod schedule;
pub mod sync;

pub use read::{CacheReader, Payload};
pub use schedule::{run_cycle, run_periodic};
pub use sync::{SyncOrchestrator, SyncReport};
