//! SQLite-based item sink
//!
//! This module provides a sink that writes every emitted item to the
//! SQLite storage backend under the current run.

use crate::output::traits::{ItemSink, OutputError, OutputResult};
use crate::state::Item;
use crate::storage::{RunStatus, Storage};
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite-based item sink
pub struct SqliteItemSink {
    storage: Arc<Mutex<dyn Storage>>,
    run_id: i64,
}

impl SqliteItemSink {
    /// Creates a new SQLite item sink
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend to use
    /// * `run_id` - The run items are recorded under
    pub fn new(storage: Arc<Mutex<dyn Storage>>, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    fn lock(&self) -> OutputResult<MutexGuard<'_, dyn Storage + 'static>> {
        self.storage
            .lock()
            .map_err(|e| OutputError::Storage(format!("Failed to lock storage: {}", e)))
    }
}

impl ItemSink for SqliteItemSink {
    fn record(&self, item: &Item) -> OutputResult<()> {
        let mut storage = self.lock()?;
        storage
            .insert_item(self.run_id, item)
            .map_err(|e| OutputError::Storage(e.to_string()))?;
        Ok(())
    }

    fn finalize(&self, status: RunStatus) -> OutputResult<()> {
        let mut storage = self.lock()?;

        let result = match status {
            RunStatus::Completed => storage.complete_run(self.run_id),
            RunStatus::Failed => storage.fail_run(self.run_id),
            RunStatus::Running => Ok(()),
        };
        result.map_err(|e| OutputError::Storage(e.to_string()))
    }
}
