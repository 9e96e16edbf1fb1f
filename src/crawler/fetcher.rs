//! HTTP dispatch for portal requests
//!
//! This module handles all HTTP traffic for the crawler, including:
//! - Building one HTTP client per session, each with its own cookie jar
//! - Applying form bodies and per-request headers
//! - Following redirects so handlers see the final URL
//! - Mapping non-2xx answers to errors

use crate::config::ClientConfig;
use crate::crawler::request::{PortalRequest, PortalResponse};
use crate::session::SessionKey;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Why a request produced no usable response
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Sends portal requests
///
/// The coordinator only talks to this trait, so crawls can be driven
/// against canned responses in tests.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &PortalRequest) -> Result<PortalResponse, FetchError>;
}

/// Builds an HTTP client bound to one cookie jar
///
/// # Arguments
///
/// * `config` - Client timeouts and user agent
/// * `jar` - Cookie store for the session this client serves
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ClientConfig, jar: Arc<Jar>) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .cookie_provider(jar)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Portal dispatcher keeping one cookie jar per session key
pub struct HttpDispatcher {
    config: ClientConfig,
    sessions: Mutex<HashMap<SessionKey, Client>>,
}

impl HttpDispatcher {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the client for a session, creating it with a fresh jar on first use
    fn client_for(&self, session: &SessionKey) -> Result<Client, reqwest::Error> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(client) = sessions.get(session) {
            return Ok(client.clone());
        }

        tracing::debug!("Opening cookie jar for session \"{}\"", session);
        let client = build_http_client(&self.config, Arc::new(Jar::default()))?;
        sessions.insert(session.clone(), client.clone());
        Ok(client)
    }

    /// Number of sessions opened so far
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for HttpDispatcher {
    async fn fetch(&self, request: &PortalRequest) -> Result<PortalResponse, FetchError> {
        let client = self.client_for(&request.context.session)?;

        let mut builder = client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        tracing::debug!("{} {} ({})", request.method, request.url, request.stage);
        let response = builder.send().await?;

        let status = response.status();
        let url = response.url().to_string();

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        Ok(PortalResponse {
            url,
            status: status.as_u16(),
            body,
        })
    }
}
