//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::session::ScrapeMode;
use crate::state::Item;
use crate::storage::{ItemRecord, RunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage: Send {
    // ===== Run Management =====

    /// Creates a new crawl run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `mode` - Scrape mode the run was started with
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, mode: ScrapeMode) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run, if any
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as completed and stamps its finish time
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    /// Marks a run as failed and stamps its finish time
    fn fail_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Items =====

    /// Stores an emitted item
    ///
    /// # Returns
    ///
    /// The row ID of the stored item
    fn insert_item(&mut self, run_id: i64, item: &Item) -> StorageResult<i64>;

    /// Loads every item of a run in emission order
    fn get_items(&self, run_id: i64) -> StorageResult<Vec<ItemRecord>>;

    fn count_items(&self, run_id: i64) -> StorageResult<u64>;

    /// Item counts per kind, most frequent first
    fn count_items_by_kind(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>>;

    /// Item counts per sync status, most frequent first
    ///
    /// Items without a sync status are not counted.
    fn count_items_by_sync_status(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>>;
}
