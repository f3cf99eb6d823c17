//! Configuration loading from disk.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServiceConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {0}")]
    Validation(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServiceConfig = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

/// Semantic checks serde cannot express.
pub fn validate(config: &ServiceConfig) -> Result<(), ConfigError> {
    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation(format!(
            "bind_address {:?} is not a socket address",
            config.server.bind_address
        )));
    }
    if config.server.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be positive".to_string(),
        ));
    }
    if config.client.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "client.timeout_secs must be positive".to_string(),
        ));
    }
    if EnvFilter::try_new(&config.logging.level).is_err() {
        return Err(ConfigError::Validation(format!(
            "logging.level {:?} is not a valid filter",
            config.logging.level
        )));
    }
    Ok(())
}
