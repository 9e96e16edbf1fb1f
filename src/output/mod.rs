//! Output module for recording crawl items
//!
//! This module handles:
//! - Receiving emitted items through the `ItemSink` trait
//! - Persisting them to SQLite (`SqliteItemSink`) or memory (`MemorySink`)
//! - Summarizing a run's items by kind and sync status

mod memory;
mod sqlite_output;
pub mod stats;
mod traits;

pub use memory::MemorySink;
pub use sqlite_output::SqliteItemSink;
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{ItemSink, OutputError, OutputResult};
