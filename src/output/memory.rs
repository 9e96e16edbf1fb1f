//! In-memory item sink

use crate::output::traits::{ItemSink, OutputError, OutputResult};
use crate::state::Item;
use crate::storage::RunStatus;
use std::sync::{Arc, Mutex};

/// Collects emitted items in memory
///
/// Clones share the same buffer, so a handle kept by the caller sees
/// everything recorded through the copy given to the coordinator.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    items: Arc<Mutex<Vec<Item>>>,
    status: Arc<Mutex<Option<RunStatus>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the items recorded so far
    pub fn items(&self) -> Vec<Item> {
        self.items
            .lock()
            .map(|items| items.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Status passed to `finalize`, if it has been called
    pub fn final_status(&self) -> Option<RunStatus> {
        self.status.lock().ok().and_then(|status| *status)
    }
}

impl ItemSink for MemorySink {
    fn record(&self, item: &Item) -> OutputResult<()> {
        self.items
            .lock()
            .map_err(|e| OutputError::Write(e.to_string()))?
            .push(item.clone());
        Ok(())
    }

    fn finalize(&self, status: RunStatus) -> OutputResult<()> {
        *self
            .status
            .lock()
            .map_err(|e| OutputError::Write(e.to_string()))? = Some(status);
        Ok(())
    }
}
