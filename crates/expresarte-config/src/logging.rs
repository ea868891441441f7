//! Logging and tracing export settings.
//!
//! - `LOG_LEVEL`: default filter when `RUST_LOG` is unset (default: `info`)
//! - `LOG_DIR`: directory for rolling JSON log files (default: `logs`)
//! - `OBSERVABILITY_ENABLED`: turn on OTLP export and Prometheus metrics
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` (default: `http://localhost:4317`)
//! - `OTEL_SERVICE_NAME` (default: `expresarte`)

use crate::{env_lookup, load_dotenv, flag};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: String,
    pub observability_enabled: bool,
    pub otlp_endpoint: String,
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: "logs".to_string(),
            observability_enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: "expresarte".to_string(),
        }
    }
}

impl LoggingConfig {
    #[must_use]
    pub fn from_env() -> Self {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            level: lookup("LOG_LEVEL").unwrap_or(defaults.level),
            log_dir: lookup("LOG_DIR").unwrap_or(defaults.log_dir),
            observability_enabled: flag(&lookup, "OBSERVABILITY_ENABLED"),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or(defaults.otlp_endpoint),
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),
        }
    }
}
