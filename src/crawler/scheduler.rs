//! Request admission and dispatch
//!
//! This module handles:
//! - De-duplication of requests by fingerprint (forced requests bypass it)
//! - Global concurrency limiting via a semaphore
//! - Deferred resubmission of retried requests on a timer
//! - Tracking in-flight and deferred work so the crawl knows when it is done

use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::request::{PortalRequest, PortalResponse};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

/// Something the coordinator loop has to react to
#[derive(Debug)]
pub enum Event {
    /// A dispatched request finished
    Fetched {
        request: PortalRequest,
        result: Result<PortalResponse, FetchError>,
    },
    /// A deferred request's delay has passed
    Due(PortalRequest),
}

/// Admits requests and runs them concurrently
///
/// Every spawned fetch and every pending timer reports back on the event
/// channel; the scheduler is idle once neither is outstanding.
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    /// Fingerprints of every request admitted so far
    seen: HashSet<String>,

    fetcher: Arc<dyn Fetcher>,
    events: mpsc::UnboundedSender<Event>,

    in_flight: usize,
    deferred: usize,
    duplicates: usize,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `max_concurrent` - Maximum number of requests in flight
    /// * `fetcher` - Sends the admitted requests
    /// * `events` - Channel the coordinator loop reads
    pub fn new(
        max_concurrent: usize,
        fetcher: Arc<dyn Fetcher>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            seen: HashSet::new(),
            fetcher,
            events,
            in_flight: 0,
            deferred: 0,
            duplicates: 0,
        }
    }

    /// Dispatches a request unless an identical one was already admitted
    ///
    /// # Returns
    ///
    /// `true` if the request was dispatched, `false` if it was filtered
    pub fn submit(&mut self, request: PortalRequest) -> bool {
        let fresh = self.seen.insert(request.fingerprint());
        if !fresh && !request.force {
            self.duplicates += 1;
            tracing::debug!("Filtered duplicate request {} {}", request.method, request.url);
            return false;
        }

        self.in_flight += 1;
        let semaphore = Arc::clone(&self.semaphore);
        let fetcher = Arc::clone(&self.fetcher);
        let events = self.events.clone();

        tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let result = fetcher.fetch(&request).await;
            // The receiver only goes away when the coordinator has stopped
            let _ = events.send(Event::Fetched { request, result });
        });
        true
    }

    /// Resubmits a request once `delay` has passed, without blocking
    pub fn defer(&mut self, request: PortalRequest, delay: Duration) {
        self.deferred += 1;
        let events = self.events.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::Due(request));
        });
    }

    /// Records that a dispatched request has reported back
    pub fn on_fetched(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Records that a deferred request has come due
    pub fn on_due(&mut self) {
        self.deferred = self.deferred.saturating_sub(1);
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.deferred == 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn deferred(&self) -> usize {
        self.deferred
    }

    pub fn duplicates_filtered(&self) -> usize {
        self.duplicates
    }
}
