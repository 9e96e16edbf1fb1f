//! Item sink trait and error types
//!
//! Every item the crawl emits is handed to an `ItemSink`. Sinks are called
//! from the coordinator loop one item at a time and must be thread-safe.

use crate::state::Item;
use crate::storage::RunStatus;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives the items a crawl emits
pub trait ItemSink: Send + Sync {
    /// Records one emitted item
    ///
    /// # Arguments
    ///
    /// * `item` - The item, in emission order
    fn record(&self, item: &Item) -> OutputResult<()>;

    /// Finalizes the output once the crawl has stopped
    ///
    /// # Arguments
    ///
    /// * `status` - The final status of the crawl run
    fn finalize(&self, status: RunStatus) -> OutputResult<()>;
}
