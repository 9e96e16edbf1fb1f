//! Requests, responses and the steps a handler asks the coordinator to take

use crate::crawler::retry::RetryBudget;
use crate::services::{DocumentUpload, Notification, SecondaryCheck};
use crate::session::{Credential, SessionKey};
use crate::state::{Item, MemberRecord, Stage};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;

/// Data that travels with a request and comes back with its response
#[derive(Debug, Clone)]
pub struct CrawlContext {
    pub record: Arc<MemberRecord>,
    pub session: SessionKey,
    /// Only present until the login response is handled
    pub credential: Option<Arc<Credential>>,
    pub retry: RetryBudget,
}

impl CrawlContext {
    pub fn new(record: MemberRecord, session: SessionKey) -> Self {
        Self {
            record: Arc::new(record),
            session,
            credential: None,
            retry: RetryBudget::default(),
        }
    }

    /// Context for a follow-up request in the same session
    ///
    /// The credential is not carried over and the retry budget starts fresh.
    pub fn follow(&self, record: MemberRecord) -> Self {
        Self::new(record, self.session.clone())
    }

    /// Context for a follow-up request sharing this record
    pub fn follow_shared(&self) -> Self {
        Self {
            record: Arc::clone(&self.record),
            session: self.session.clone(),
            credential: None,
            retry: RetryBudget::default(),
        }
    }

    pub fn with_credential(mut self, credential: Arc<Credential>) -> Self {
        self.credential = Some(credential);
        self
    }
}

/// One HTTP request to the portal
#[derive(Debug, Clone)]
pub struct PortalRequest {
    pub url: String,
    pub method: Method,
    pub form: Vec<(String, String)>,
    pub headers: Vec<(&'static str, String)>,
    pub stage: Stage,
    pub context: CrawlContext,
    /// Skip de-duplication
    pub force: bool,
}

impl PortalRequest {
    pub fn get(url: impl Into<String>, stage: Stage, context: CrawlContext) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            form: Vec::new(),
            headers: Vec::new(),
            stage,
            context,
            force: false,
        }
    }

    pub fn post_form(
        url: impl Into<String>,
        form: Vec<(String, String)>,
        stage: Stage,
        context: CrawlContext,
    ) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            form,
            headers: Vec::new(),
            stage,
            context,
            force: false,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Marks the request as an AJAX call
    pub fn xhr(self) -> Self {
        self.header("X-Requested-With", "XMLHttpRequest")
    }

    /// De-duplication key: session, method, URL and form body
    pub fn fingerprint(&self) -> String {
        let form = self
            .form
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!(
            "{}|{}|{}|{}",
            self.context.session, self.method, self.url, form
        )
    }

    /// The same request again, forced past de-duplication with a new budget
    pub fn reissue(&self, budget: RetryBudget) -> Self {
        let mut request = self.clone();
        request.context.retry = budget;
        request.force = true;
        request
    }
}

/// What the portal answered
#[derive(Debug, Clone)]
pub struct PortalResponse {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// An action a handler asks the coordinator to carry out
#[derive(Debug, Clone)]
pub enum Step {
    /// Dispatch a new request
    Request(PortalRequest),
    /// Dispatch a request again once `delay` has passed
    Retry {
        request: PortalRequest,
        delay: Duration,
    },
    /// Hand an item to the sink
    Emit(Item),
    Notify(Notification),
    Secondary(SecondaryCheck),
    StoreDocument(DocumentUpload),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_context(user: &str) -> CrawlContext {
        CrawlContext::new(MemberRecord::new(), SessionKey::new(user))
    }

    #[test]
    fn test_fingerprint_includes_session() {
        let a = PortalRequest::get("https://p/roster", Stage::Roster, create_test_context("a"));
        let b = PortalRequest::get("https://p/roster", Stage::Roster, create_test_context("b"));
        assert_ne!(a.fingerprint(), b.fingerprint());

        let a2 = PortalRequest::get("https://p/roster", Stage::Roster, create_test_context("a"));
        assert_eq!(a.fingerprint(), a2.fingerprint());
    }

    #[test]
    fn test_fingerprint_includes_form() {
        let form = |pw: &str| vec![("password".to_string(), pw.to_string())];
        let a = PortalRequest::post_form("https://p/login", form("x"), Stage::Login, create_test_context("u"));
        let b = PortalRequest::post_form("https://p/login", form("y"), Stage::Login, create_test_context("u"));
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.method, Method::POST);
    }

    #[test]
    fn test_reissue_forces_and_carries_budget() {
        let request = PortalRequest::get("https://p/x", Stage::MemberList, create_test_context("u")).xhr();
        let governor = crate::crawler::RetryGovernor::default();
        let budget = match governor.escalate(request.context.retry) {
            crate::crawler::RetryDecision::Reissue { budget, .. } => budget,
            other => panic!("unexpected {:?}", other),
        };

        let again = request.reissue(budget);
        assert!(again.force);
        assert!(!request.force);
        assert_eq!(again.context.retry.attempts(), 1);
        assert_eq!(again.headers, vec![("X-Requested-With", "XMLHttpRequest".to_string())]);
    }

    #[test]
    fn test_follow_drops_credential_and_budget() {
        let credential: Credential =
            serde_json::from_str(r#"{"username": "u", "password": "p"}"#).unwrap();
        let mut context = create_test_context("u").with_credential(Arc::new(credential));
        context.retry = request_budget(2);

        let next = context.follow(MemberRecord::new());
        assert!(next.credential.is_none());
        assert_eq!(next.retry.attempts(), 0);
        assert_eq!(next.session, context.session);
    }

    fn request_budget(failures: usize) -> RetryBudget {
        let governor = crate::crawler::RetryGovernor::default();
        let mut budget = RetryBudget::default();
        for _ in 0..failures {
            if let crate::crawler::RetryDecision::Reissue { budget: next, .. } = governor.escalate(budget) {
                budget = next;
            }
        }
        budget
    }
}
