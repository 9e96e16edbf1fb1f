//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the event loop that drives a crawl:
//! - Seeding the scheduler with one homepage request per credential
//! - Handing each response to the spider, one at a time
//! - Carrying out the steps the spider returns (requests, retries, items,
//!   notifications, document uploads and secondary hand-offs)
//! - Finalizing the item sink once no work is left

use crate::config::Config;
use crate::crawler::fetcher::{Fetcher, HttpDispatcher};
use crate::crawler::request::{PortalRequest, Step};
use crate::crawler::scheduler::{Event, Scheduler};
use crate::crawler::spider::EligibilitySpider;
use crate::output::{ItemSink, SqliteItemSink};
use crate::services::{
    DocumentSink, HttpDocumentSink, LogNotifier, LogSecondary, Notifier, NullDocumentSink,
    SecondaryEligibility, WebhookNotifier,
};
use crate::session::{Credential, ScrapeMode, TargetMember};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::CrawlerError;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Counters describing a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub requests_dispatched: usize,
    pub duplicates_filtered: usize,
    pub retries_scheduled: usize,
    pub items_emitted: usize,
    pub notifications_sent: usize,
    pub documents_stored: usize,
    pub secondary_checks: usize,
    /// Requests that never produced a usable response
    pub transport_failures: usize,
    pub elapsed: Duration,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    spider: EligibilitySpider,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn ItemSink>,
    notifier: Arc<dyn Notifier>,
    documents: Arc<dyn DocumentSink>,
    secondary: Arc<dyn SecondaryEligibility>,
    max_concurrent: usize,
}

impl Coordinator {
    /// Creates a coordinator with log-only collaborators
    ///
    /// # Arguments
    ///
    /// * `spider` - The navigation state machine
    /// * `fetcher` - Sends portal requests
    /// * `sink` - Receives every emitted item
    pub fn new(
        spider: EligibilitySpider,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn ItemSink>,
    ) -> Self {
        Self {
            spider,
            fetcher,
            sink,
            notifier: Arc::new(LogNotifier),
            documents: Arc::new(NullDocumentSink),
            secondary: Arc::new(LogSecondary),
            max_concurrent: 8,
        }
    }

    /// Creates a coordinator wired to the HTTP portal and the collaborators in `config`
    ///
    /// Notifications go to the webhook when one is configured and to the log
    /// otherwise; documents go to the render service when one is configured.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlerError)` - A collaborator's HTTP client could not be built
    pub fn from_config(
        config: &Config,
        spider: EligibilitySpider,
        sink: Arc<dyn ItemSink>,
    ) -> Result<Self, CrawlerError> {
        let fetcher = Arc::new(HttpDispatcher::new(config.client.clone()));
        let mut coordinator = Self::new(spider, fetcher, sink)
            .with_max_concurrent(config.client.max_concurrent_requests as usize);

        if let Some(url) = config.notify.as_ref().and_then(|n| n.webhook_url.as_deref()) {
            coordinator = coordinator.with_notifier(Arc::new(WebhookNotifier::new(url)?));
        }
        if let Some(render) = &config.render {
            coordinator = coordinator.with_documents(Arc::new(HttpDocumentSink::new(&render.url)?));
        }
        Ok(coordinator)
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentSink>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn SecondaryEligibility>) -> Self {
        self.secondary = secondary;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Runs the crawl until no request is in flight or deferred
    ///
    /// Handler failures never stop the loop; they come back from the spider
    /// as notifications and retries. Item sink write errors are logged and
    /// the crawl continues.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - Crawl finished and the sink was finalized
    /// * `Err(CrawlerError)` - The sink could not be finalized
    pub async fn run(&self) -> Result<RunSummary, CrawlerError> {
        let start_time = Instant::now();
        tracing::info!(
            "Starting {} crawl for {} credential(s)",
            self.spider.mode(),
            self.spider.credentials().len()
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(self.max_concurrent, Arc::clone(&self.fetcher), tx);
        let mut handoffs = JoinSet::new();
        let mut summary = RunSummary::default();

        for request in self.spider.start_requests() {
            self.submit(&mut scheduler, request, &mut summary);
        }

        while !scheduler.is_idle() {
            // The scheduler owns a sender, so the channel cannot close here
            let Some(event) = rx.recv().await else {
                break;
            };

            match event {
                Event::Fetched { request, result } => {
                    scheduler.on_fetched();
                    let steps = match result {
                        Ok(response) => {
                            tracing::debug!(
                                "Handling {} response from {} (HTTP {})",
                                request.stage,
                                response.url,
                                response.status
                            );
                            self.spider.handle(&request, response)
                        }
                        Err(e) => {
                            summary.transport_failures += 1;
                            self.spider.on_transport_error(&request, &e.to_string())
                        }
                    };
                    self.apply(steps, &mut scheduler, &mut handoffs, &mut summary);
                    reap_finished(&mut handoffs);
                }
                Event::Due(request) => {
                    scheduler.on_due();
                    self.submit(&mut scheduler, request, &mut summary);
                }
            }
        }

        while let Some(joined) = handoffs.join_next().await {
            log_handoff(joined);
        }

        summary.duplicates_filtered = scheduler.duplicates_filtered();
        summary.elapsed = start_time.elapsed();

        self.sink.finalize(RunStatus::Completed)?;

        tracing::info!(
            "Crawl completed: {} requests, {} items, {} retries, {} notifications in {:?}",
            summary.requests_dispatched,
            summary.items_emitted,
            summary.retries_scheduled,
            summary.notifications_sent,
            summary.elapsed
        );

        Ok(summary)
    }

    fn submit(&self, scheduler: &mut Scheduler, request: PortalRequest, summary: &mut RunSummary) {
        if scheduler.submit(request) {
            summary.requests_dispatched += 1;

            if summary.requests_dispatched % 100 == 0 {
                tracing::info!(
                    "Progress: {} requests dispatched, {} in flight, {} deferred, {} items",
                    summary.requests_dispatched,
                    scheduler.in_flight(),
                    scheduler.deferred(),
                    summary.items_emitted
                );
            }
        }
    }

    /// Carries out the steps returned by a handler, in order
    fn apply(
        &self,
        steps: Vec<Step>,
        scheduler: &mut Scheduler,
        handoffs: &mut JoinSet<()>,
        summary: &mut RunSummary,
    ) {
        for step in steps {
            match step {
                Step::Request(request) => self.submit(scheduler, request, summary),

                Step::Retry { request, delay } => {
                    summary.retries_scheduled += 1;
                    scheduler.defer(request, delay);
                }

                Step::Emit(item) => {
                    summary.items_emitted += 1;
                    if let Err(e) = self.sink.record(&item) {
                        tracing::error!("Failed to record {} item: {}", item.kind(), e);
                    }
                }

                Step::Notify(notification) => {
                    summary.notifications_sent += 1;
                    let notifier = Arc::clone(&self.notifier);
                    handoffs.spawn(async move {
                        if let Err(e) = notifier.notify(&notification).await {
                            tracing::warn!(
                                "Failed to deliver notification '{}': {}",
                                notification.subject,
                                e
                            );
                        }
                    });
                }

                Step::Secondary(check) => {
                    summary.secondary_checks += 1;
                    let secondary = Arc::clone(&self.secondary);
                    handoffs.spawn(async move {
                        if let Err(e) = secondary.check(&check).await {
                            tracing::warn!(
                                "Secondary eligibility check for subscriber {} failed: {}",
                                check.subscriber_id,
                                e
                            );
                        }
                    });
                }

                Step::StoreDocument(upload) => {
                    summary.documents_stored += 1;
                    let documents = Arc::clone(&self.documents);
                    handoffs.spawn(async move {
                        match documents.store(&upload).await {
                            Ok(status) if status.is_ok() => {
                                tracing::info!("Stored '{}'", upload.name);
                            }
                            Ok(status) => tracing::error!(
                                "Render service reported '{}' for '{}'",
                                status.status,
                                upload.name
                            ),
                            Err(e) => tracing::error!("Failed to store '{}': {}", upload.name, e),
                        }
                    });
                }
            }
        }
    }
}

/// Runs a complete crawl against the portal in `config`
///
/// This is the main entry point for the binary. It will:
/// 1. Open the SQLite database and start a run
/// 2. Build the spider and the HTTP-backed coordinator
/// 3. Crawl until every branch has finished
/// 4. Mark the run completed, or failed if the crawl could not finish
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the config file, stored with the run
/// * `mode` - Which part of the portal to walk
/// * `credentials` - Portal logins, one session each
/// * `targets` - Members to look up in partial mode
///
/// # Example
///
/// ```no_run
/// use eligibility_crawler::config::load_config_with_hash;
/// use eligibility_crawler::crawler::run_crawl;
/// use eligibility_crawler::session::load_credentials;
/// use eligibility_crawler::ScrapeMode;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let credentials = load_credentials("creds.json")?;
/// let summary = run_crawl(&config, &hash, ScrapeMode::All, credentials, Vec::new()).await?;
/// println!("{} items", summary.items_emitted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    config_hash: &str,
    mode: ScrapeMode,
    credentials: Vec<Credential>,
    targets: Vec<TargetMember>,
) -> Result<RunSummary, CrawlerError> {
    let spider = EligibilitySpider::from_config(config, mode, credentials, targets)?;

    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run_id = storage.create_run(config_hash, mode)?;
    tracing::info!("Starting run {}", run_id);

    let storage: Arc<Mutex<dyn Storage>> = Arc::new(Mutex::new(storage));
    let sink = Arc::new(SqliteItemSink::new(storage, run_id));
    let coordinator = match Coordinator::from_config(config, spider, sink.clone()) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            sink.finalize(RunStatus::Failed)?;
            return Err(e);
        }
    };

    coordinator.run().await
}

/// Collects hand-off tasks that have already finished, without waiting
fn reap_finished(handoffs: &mut JoinSet<()>) {
    while let Some(joined) = handoffs.try_join_next() {
        log_handoff(joined);
    }
}

fn log_handoff(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!("Hand-off task failed: {}", e);
    }
}
