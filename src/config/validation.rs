//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All errors are collected
//! rather than stopping at the first one.

use std::fmt;

use tracing_subscriber::filter::LevelFilter;

use crate::config::schema::AppConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
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

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::new("listener.port", "must be non-zero"));
    }

    if config.logging.service_name.trim().is_empty() {
        errors.push(ValidationError::new("logging.service_name", "must not be empty"));
    }

    if config.logging.level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::new(
            "logging.level",
            format!("unknown level '{}'", config.logging.level),
        ));
    }

    if config.logging.max_file_size_bytes == 0 {
        errors.push(ValidationError::new(
            "logging.max_file_size_bytes",
            "must be greater than zero",
        ));
    }

    if config.logging.retention_days == 0 {
        errors.push(ValidationError::new(
            "logging.retention_days",
            "must keep at least one day",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
