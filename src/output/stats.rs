//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! item statistics for a crawl run from the storage layer.

use crate::output::traits::{OutputError, OutputResult};
use crate::storage::{RunRecord, Storage};

/// Item statistics for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub run: RunRecord,

    /// Total number of items emitted
    pub total_items: u64,

    /// Count of items by kind, most frequent first
    pub items_by_kind: Vec<(String, u64)>,

    /// Count of items by sync status, most frequent first
    pub items_by_sync_status: Vec<(String, u64)>,
}

impl CrawlStatistics {
    /// Number of items of one kind
    pub fn kind_count(&self, kind: &str) -> u64 {
        lookup(&self.items_by_kind, kind)
    }

    /// Number of items with one sync status
    pub fn sync_status_count(&self, status: &str) -> u64 {
        lookup(&self.items_by_sync_status, status)
    }
}

fn lookup(counts: &[(String, u64)], key: &str) -> u64 {
    counts
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, n)| *n)
        .unwrap_or(0)
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `run_id` - Run to summarize; the latest run when `None`
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(OutputError)` - No such run, or the query failed
pub fn load_statistics(
    storage: &dyn Storage,
    run_id: Option<i64>,
) -> OutputResult<CrawlStatistics> {
    let storage_err = |e: crate::storage::StorageError| OutputError::Storage(e.to_string());

    let run = match run_id {
        Some(id) => storage.get_run(id).map_err(storage_err)?,
        None => storage
            .get_latest_run()
            .map_err(storage_err)?
            .ok_or_else(|| OutputError::Storage("No crawl runs found in database".to_string()))?,
    };

    let total_items = storage.count_items(run.id).map_err(storage_err)?;
    let items_by_kind = storage.count_items_by_kind(run.id).map_err(storage_err)?;
    let items_by_sync_status = storage
        .count_items_by_sync_status(run.id)
        .map_err(storage_err)?;

    Ok(CrawlStatistics {
        run,
        total_items,
        items_by_kind,
        items_by_sync_status,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  ID: {}", stats.run.id);
    println!("  Mode: {}", stats.run.mode);
    println!("  Status: {}", stats.run.status.to_db_string());
    println!("  Started: {}", stats.run.started_at);
    if let Some(finished) = &stats.run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!();

    println!("Items by Kind:");
    for (kind, count) in &stats.items_by_kind {
        let percentage = if stats.total_items > 0 {
            (*count as f64 / stats.total_items as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", kind, count, percentage);
    }
    println!();

    if !stats.items_by_sync_status.is_empty() {
        println!("Items by Sync Status:");
        for (status, count) in &stats.items_by_sync_status {
            println!("  {}: {}", status, count);
        }
        println!();
    }

    let members = stats.kind_count("member");
    let updated = stats.sync_status_count("Updated");
    println!(
        "Total: {} items, {} member records, {} with confirmed eligibility",
        stats.total_items, members, updated
    );
}
