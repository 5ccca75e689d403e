//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and formats.
//! Every violation is reported, not just the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted key of the offending setting.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.application.name.trim().is_empty() {
        errors.push(ValidationError::new("application.name", "must not be empty"));
    }
    if config.application.environment.trim().is_empty() {
        errors.push(ValidationError::new(
            "application.environment",
            "must not be empty",
        ));
    }

    let server = &config.server;
    if let Err(e) = server.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("`{}` is not a socket address ({})", server.bind_address, e),
        ));
    }
    if server.max_concurrent_requests == 0 {
        errors.push(ValidationError::new(
            "server.max_concurrent_requests",
            "must be greater than 0",
        ));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than 0",
        ));
    }
    if server.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "server.max_body_bytes",
            "must be greater than 0",
        ));
    }
    if server.shutdown_grace_secs == 0 {
        errors.push(ValidationError::new(
            "server.shutdown_grace_secs",
            "must be greater than 0",
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!(
                "`{}` is not one of {}",
                config.observability.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_violation() {
        let mut config = AppConfig::default();
        config.server.bind_address = "localhost".into();
        config.server.request_timeout_secs = 0;
        config.observability.log_level = "verbose".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "server.request_timeout_secs",
                "observability.log_level",
            ]
        );
    }

    #[test]
    fn zero_shutdown_grace_is_rejected() {
        let mut config = AppConfig::default();
        config.server.shutdown_grace_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "server.shutdown_grace_secs: must be greater than 0"
        );
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = AppConfig::default();
        config.observability.log_level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn blank_identity_is_rejected() {
        let mut config = AppConfig::default();
        config.application.name = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].to_string(), "application.name: must not be empty");
    }
}
