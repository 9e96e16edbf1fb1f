//! Crawler module for portal navigation and request dispatch
//!
//! This module contains the core crawling logic, including:
//! - The navigation state machine (`EligibilitySpider`)
//! - HTTP dispatch with one cookie jar per session
//! - Request de-duplication, concurrency limiting and deferred retries
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod request;
mod retry;
mod scheduler;
mod spider;

pub use coordinator::{run_crawl, Coordinator, RunSummary};
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpDispatcher};
pub use request::{CrawlContext, PortalRequest, PortalResponse, Step};
pub use retry::{RetryBudget, RetryDecision, RetryGovernor};
pub use scheduler::{Event, Scheduler};
pub use spider::{CrawlFailure, EligibilitySpider};
