use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the eligibility crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub notify: Option<NotifyConfig>,
    #[serde(default)]
    pub render: Option<RenderConfig>,
}

/// Portal location and identity
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Root URL of the provider portal (no trailing path)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Short name used as the secondary-check source tag and in notification subjects
    #[serde(default = "default_portal_name")]
    pub name: String,
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// User agent sent with every portal request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum number of requests in flight at once
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent")]
    pub max_concurrent_requests: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

/// Bounded retry schedule
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Delay before each reissue, in milliseconds; its length is the reissue bound
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: Vec<u64>,
}

impl RetryConfig {
    /// Returns the backoff schedule as durations
    pub fn backoff(&self) -> Vec<Duration> {
        self.backoff_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Failure notification delivery
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Endpoint receiving `{subject, body}` JSON; notifications are only logged when absent
    #[serde(rename = "webhook-url", default)]
    pub webhook_url: Option<String>,

    /// Host name reported in notification bodies
    #[serde(default)]
    pub host: Option<String>,
}

/// Document render/store service
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Endpoint accepting eligibility pages for PDF rendering and storage
    pub url: String,
}

fn default_portal_name() -> String {
    "portal".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
        .to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent() -> u32 {
    8
}

fn default_backoff_ms() -> Vec<u64> {
    vec![5_000, 10_000, 15_000, 30_000]
}
