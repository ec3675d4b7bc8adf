//! Prometheus metrics for the compliance service.
//!
//! Business metrics:
//! - `navigator_voyages_evaluated_total{status}`: successful evaluations by class
//! - `navigator_evaluations_failed_total{reason}`: failures by `Error::kind` label
//! - `navigator_fleet_reports_served_total`
//! - `navigator_ghg_intensity{formula}`: histogram of evaluated intensities
//! - `navigator_pools_evaluated_total{compliant}`
//! - `navigator_artifact_reloads_total{source}`
//!
//! HTTP metrics are recorded by [`crate::middleware::track_requests`].

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use navigator_lib::{ComplianceStatus, IntensityFormula, TargetSource};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MetricsConfig {
    /// `METRICS_ENABLED=false` disables the recorder (default: enabled).
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        Self { enabled }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MetricsError {
    #[error("metrics are disabled")]
    Disabled,
    #[error("metrics recorder already initialized")]
    AlreadyInitialized,
    #[error("failed to install metrics recorder: {0}")]
    InstallFailed(String),
}

/// Install the global Prometheus recorder. Must run before any metric is recorded.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }
    if PROMETHEUS_HANDLE.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;
    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

/// `GET /metrics`: Prometheus exposition text.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

pub fn record_voyage_evaluated(status: ComplianceStatus) {
    metrics::counter!(
        "navigator_voyages_evaluated_total",
        "status" => status.as_str()
    )
    .increment(1);
}

/// `reason` is an `Error::kind` label or `validation_error`.
pub fn record_evaluation_failed(reason: &'static str) {
    metrics::counter!(
        "navigator_evaluations_failed_total",
        "reason" => reason
    )
    .increment(1);
}

pub fn record_fleet_report_served() {
    metrics::counter!("navigator_fleet_reports_served_total").increment(1);
}

pub fn record_ghg_intensity(intensity: f64, formula: IntensityFormula) {
    metrics::histogram!(
        "navigator_ghg_intensity",
        "formula" => formula.denominator()
    )
    .record(intensity);
}

pub fn record_pool_evaluated(compliant: bool) {
    metrics::counter!(
        "navigator_pools_evaluated_total",
        "compliant" => if compliant { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_artifacts_reloaded(source: TargetSource) {
    let source = match source {
        TargetSource::Loaded => "loaded",
        TargetSource::Fallback => "fallback",
        TargetSource::Explicit => "explicit",
    };
    metrics::counter!("navigator_artifact_reloads_total", "source" => source).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_is_rejected() {
        let err = init_metrics(&MetricsConfig { enabled: false }).unwrap_err();
        assert_eq!(err.to_string(), "metrics are disabled");
    }

    #[tokio::test]
    async fn handler_renders_without_recorder() {
        let output = metrics_handler().await;
        assert!(output.starts_with('#') || output.is_empty());
    }

    #[test]
    fn helpers_record_without_a_recorder() {
        record_voyage_evaluated(ComplianceStatus::Surplus);
        record_voyage_evaluated(ComplianceStatus::Deficit);
        record_evaluation_failed("degenerate_division");
        record_fleet_report_served();
        record_ghg_intensity(79.6, IntensityFormula::EnergyNormalized);
        record_pool_evaluated(false);
        record_artifacts_reloaded(TargetSource::Loaded);
    }
}
