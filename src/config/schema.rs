//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Structured logging and log file retention.
    pub logging: LoggingConfig,

    /// Metrics registry settings.
    pub metrics: MetricsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. Overridden by the `PORT` environment variable.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Value of the `service` field stamped on every record.
    pub service_name: String,

    /// Default level filter (trace, debug, info, warn, error).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Directory holding the rotating log files and crash logs.
    pub directory: String,

    /// File name prefix for the daily files (`<prefix>-YYYY-MM-DD.log`).
    pub file_prefix: String,

    /// Size at which the active file is rotated, in bytes.
    pub max_file_size_bytes: u64,

    /// Number of trailing days of log files to keep.
    pub retention_days: u32,

    /// Mirror records to a human-readable console stream.
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: "obs-lab".to_string(),
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_prefix: "app".to_string(),
            max_file_size_bytes: 20 * 1024 * 1024,
            retention_days: 14,
            console: true,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// `app` label attached to every series.
    pub app_label: String,

    /// `environment` label attached to every series.
    pub environment: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            app_label: "obs-lab".to_string(),
            environment: "development".to_string(),
        }
    }
}
