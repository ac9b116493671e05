//! Configuration validation.

use super::types::ServerConfig;
use portcullis_log::{LogFormat, LogLevel};
use thiserror::Error;

/// Shortest API key accepted.
pub const MIN_API_KEY_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("API key #{0} is empty")]
    EmptyApiKey(usize),

    #[error("API key #{0} is shorter than 16 characters")]
    WeakApiKey(usize),

    #[error("Invalid request timeout: must be at least 1 second")]
    InvalidTimeout,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}")]
    InvalidLogFormat(String),
}

/// Validate server configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ConfigError::InvalidPort(0));
    }

    if config.server.socket_addr().is_err() {
        errors.push(ConfigError::InvalidAddress(format!(
            "{}:{}",
            config.server.host, config.server.port
        )));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ConfigError::InvalidTimeout);
    }

    for (index, key) in config.auth.api_keys.iter().enumerate() {
        if key.trim().is_empty() {
            errors.push(ConfigError::EmptyApiKey(index));
        } else if key.len() < MIN_API_KEY_LEN {
            errors.push(ConfigError::WeakApiKey(index));
        }
    }

    if LogLevel::parse(&config.logging.level).is_none() {
        errors.push(ConfigError::InvalidLogLevel(config.logging.level.clone()));
    }

    if LogFormat::parse(&config.logging.format).is_none() {
        errors.push(ConfigError::InvalidLogFormat(config.logging.format.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
