//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::LifecycleConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<LifecycleConfig, ConfigError> {
    let config: LifecycleConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LifecycleConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), providers = config.providers.len(), "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [observability]
        log_level = "debug"

        [[providers]]
        name = "east-cloud"
        identity_url = "https://keystone.example.com:5000/v3"
        trusted_hosts = ["keystone.example.com"]

        [providers.pool]
        min_size = 1
        max_size = 4

        [providers.retry]
        delay_secs = 2
        max_attempts = 5

        [providers.proxy]
        host = "proxy.internal"
        port = 3128

        [[providers.tenants]]
        name = "demo"
        domain = "Default"
        userid = "ops"
        password = "secret"
    "#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.observability.log_level, "debug");

        let provider = config.provider("east-cloud").unwrap();
        assert_eq!(provider.connector, "compute");
        assert_eq!(provider.pool.max_size, 4);
        assert_eq!(provider.retry.max_attempts, 5);
        assert_eq!(provider.proxy.as_ref().unwrap().to_string(), "proxy.internal:3128");
        assert_eq!(provider.tenant("demo").unwrap().password, "secret");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.providers.is_empty());
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(parse_config("[[providers]"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_errors_are_reported() {
        let content = SAMPLE.replace("min_size = 1", "min_size = 9");
        let err = parse_config(&content).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().starts_with("Validation failed: "));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/tenant-pool.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
