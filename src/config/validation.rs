use crate::config::types::{
    ClientConfig, Config, NotifyConfig, OutputConfig, PortalConfig, RenderConfig, RetryConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_portal_config(&config.portal)?;
    validate_client_config(&config.client)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    if let Some(notify) = &config.notify {
        validate_notify_config(notify)?;
    }
    if let Some(render) = &config.render {
        validate_render_config(render)?;
    }
    Ok(())
}

/// Validates the portal location
fn validate_portal_config(config: &PortalConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;

    if config.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "portal name cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client limits
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be at least 1 second".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the retry schedule
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.backoff_ms.is_empty() || config.backoff_ms.len() > 10 {
        return Err(ConfigError::Validation(format!(
            "backoff_ms must list between 1 and 10 delays, got {}",
            config.backoff_ms.len()
        )));
    }

    if config.backoff_ms.iter().any(|ms| *ms == 0) {
        return Err(ConfigError::Validation(
            "backoff_ms delays must be at least 1ms".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_notify_config(config: &NotifyConfig) -> Result<(), ConfigError> {
    if let Some(url) = &config.webhook_url {
        validate_http_url("webhook-url", url)?;
    }
    Ok(())
}

fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    validate_http_url("render url", &config.url)
}

/// Checks that a configured URL parses and uses an HTTP(S) scheme
fn validate_http_url(label: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", label, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            label, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            label, value
        )));
    }

    Ok(())
}
