//! External collaborators the crawl hands work to
//!
//! Each collaborator sits behind a narrow async trait so the coordinator can
//! be driven with real HTTP services, log-only stand-ins, or test doubles:
//! - `Notifier`: failure notifications (`LogNotifier`, `WebhookNotifier`)
//! - `DocumentSink`: HTML to PDF render and storage (`HttpDocumentSink`, `NullDocumentSink`)
//! - `SecondaryEligibility`: a second eligibility source for Medicaid members (`LogSecondary`)

mod documents;
mod notifier;
mod secondary;

pub use documents::{
    DocumentIdentifier, DocumentSink, DocumentStatus, DocumentUpload, HttpDocumentSink,
    NullDocumentSink,
};
pub use notifier::{hostname, LogNotifier, Notification, Notifier, WebhookNotifier};
pub use secondary::{LogSecondary, SecondaryCheck, SecondaryEligibility};

use thiserror::Error;

/// Errors raised by collaborator implementations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service rejected request: {0}")]
    Rejected(String),
}
