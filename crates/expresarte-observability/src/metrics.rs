//! Domain counters exported through Prometheus.
//!
//! | metric | labels |
//! |---|---|
//! | `enrollments_created_total` | `subject` |
//! | `enrollment_capacity_rejections_total` | `subject` |
//! | `grades_recorded_total` | `value` |
//! | `authorization_denials_total` | `permission` |
//! | `principals_created_total` | `role` |

use std::sync::OnceLock;
use std::time::Duration;

use expresarte_config::LoggingConfig;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static METRICS_ENABLED: OnceLock<bool> = OnceLock::new();

pub fn is_metrics_enabled() -> bool {
    METRICS_ENABLED.get().copied().unwrap_or(false)
}

/// Install the Prometheus recorder. Returns `None` when observability is
/// disabled. The caller renders `/metrics` from the returned handle.
pub fn init_metrics(config: &LoggingConfig) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability_enabled {
        let _ = METRICS_ENABLED.set(false);
        return Ok(None);
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = METRICS_ENABLED.set(true);

    if let Ok(runtime) = tokio::runtime::Handle::try_current() {
        let upkeep = handle.clone();
        runtime.spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(5)).await;
                upkeep.run_upkeep();
            }
        });
    }

    Ok(Some(handle))
}

pub fn track_enrollment_created(subject: &str) {
    if !is_metrics_enabled() {
        return;
    }
    counter!("enrollments_created_total", "subject" => subject.to_string()).increment(1);
}

pub fn track_capacity_rejection(subject: &str) {
    if !is_metrics_enabled() {
        return;
    }
    counter!("enrollment_capacity_rejections_total", "subject" => subject.to_string()).increment(1);
}

pub fn track_grade_recorded(value: &str) {
    if !is_metrics_enabled() {
        return;
    }
    counter!("grades_recorded_total", "value" => value.to_string()).increment(1);
}

pub fn track_authorization_denied(permission: &str) {
    if !is_metrics_enabled() {
        return;
    }
    counter!("authorization_denials_total", "permission" => permission.to_string()).increment(1);
}

pub fn track_principal_created(role: &str) {
    if !is_metrics_enabled() {
        return;
    }
    counter!("principals_created_total", "role" => role.to_string()).increment(1);
}
