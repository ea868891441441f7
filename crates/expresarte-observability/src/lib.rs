//! Expresarte observability.
//!
//! - console logging for every build ([`init_basic_console_logging`])
//! - with the `observability` feature (default): rolling JSON log files,
//!   OpenTelemetry OTLP trace export and Prometheus domain counters
//!
//! At runtime the OTLP exporter and the metrics recorder are only installed
//! when `OBSERVABILITY_ENABLED` is set (see [`expresarte_config::LoggingConfig`]).
//! The `track_*` helpers are always callable; they record nothing until a
//! recorder is installed.
//!
//! ```no_run
//! use expresarte_config::LoggingConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = LoggingConfig::from_env();
//! expresarte_observability::init_tracing(&config)?;
//! let _metrics = expresarte_observability::init_metrics(&config)?;
//! // ...
//! expresarte_observability::shutdown_tracer().await;
//! # Ok(())
//! # }
//! ```

pub mod basic_logging;

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

pub use basic_logging::init_basic_console_logging;

#[cfg(feature = "observability")]
pub use metrics_exporter_prometheus::PrometheusHandle;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, shutdown_tracer};
#[cfg(feature = "observability")]
pub use metrics::{
    init_metrics, is_metrics_enabled, track_authorization_denied, track_capacity_rejection,
    track_enrollment_created, track_grade_recorded, track_principal_created,
};

// No-op stand-ins when the feature is compiled out.
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use expresarte_config::LoggingConfig;

    pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
        crate::init_basic_console_logging(config)
    }

    pub async fn shutdown_tracer() {}

    pub fn init_metrics(_config: &LoggingConfig) -> anyhow::Result<Option<()>> {
        Ok(None)
    }

    pub fn is_metrics_enabled() -> bool {
        false
    }

    pub fn track_enrollment_created(_subject: &str) {}
    pub fn track_capacity_rejection(_subject: &str) {}
    pub fn track_grade_recorded(_value: &str) {}
    pub fn track_authorization_denied(_permission: &str) {}
    pub fn track_principal_created(_role: &str) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
