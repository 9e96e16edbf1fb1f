use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored with every run so that item batches can be traced back
/// to the settings that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&content)))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL: &str = r#"
[portal]
base-url = "https://portal.example.net"

[output]
database-path = "./test.db"
"#;

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.portal.name, "portal");
        assert_eq!(config.client.max_concurrent_requests, 8);
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(
            config.retry.backoff(),
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(15),
                Duration::from_secs(30)
            ]
        );
        assert!(config.notify.is_none());
        assert!(config.render.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
[portal]
base-url = "https://portal.example.net"
name = "dental"

[client]
user-agent = "TestAgent/1.0"
timeout-secs = 5
connect-timeout-secs = 2
max-concurrent-requests = 3

[retry]
backoff-ms = [10, 20]

[output]
database-path = "./items.db"

[notify]
webhook-url = "https://hooks.example.net/alerts"
host = "worker-7"

[render]
url = "http://127.0.0.1:9000/htmltopdf"
"#;
        let config = parse_config(content).unwrap();

        assert_eq!(config.portal.name, "dental");
        assert_eq!(config.client.user_agent, "TestAgent/1.0");
        assert_eq!(config.client.max_concurrent_requests, 3);
        assert_eq!(config.retry.backoff_ms, vec![10, 20]);

        let notify = config.notify.unwrap();
        assert_eq!(notify.host.as_deref(), Some("worker-7"));
        assert_eq!(
            config.render.unwrap().url,
            "http://127.0.0.1:9000/htmltopdf"
        );
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let result = parse_config("this is not valid TOML {{{");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_portal_section_is_rejected() {
        let result = parse_config("[output]\ndatabase-path = \"x.db\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = r#"
[portal]
base-url = "https://portal.example.net"

[client]
max-concurrent-requests = 0

[output]
database-path = "./test.db"
"#;
        let result = parse_config(content);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_config_hash_is_stable_and_content_sensitive() {
        let file1 = create_temp_config(MINIMAL);
        let file2 = create_temp_config("content 2");

        let (_, hash1) = load_config_with_hash(file1.path()).unwrap();
        let again = compute_config_hash(file1.path()).unwrap();
        let other = compute_config_hash(file2.path()).unwrap();

        assert_eq!(hash1, again);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, other);
    }
}
