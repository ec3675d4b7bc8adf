//! Liveness and readiness checks.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use navigator_lib::TargetSource;

use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `ok`, or `degraded` when serving on the fallback target or without a fleet report.
    pub status: String,
    pub service: String,
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_source: Option<TargetSource>,

    /// Vessels in the loaded fleet report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fleet_vessels: Option<usize>,
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            target: None,
            target_source: None,
            fleet_vessels: None,
        }
    }

    /// Readiness view of `state`.
    pub fn from_state(service: &str, version: &str, state: &AppState) -> Self {
        let snapshot = state.snapshot();
        let source = snapshot.source;
        let fleet_vessels = snapshot.fleet.as_ref().map(|rows| rows.len());
        let degraded = source == TargetSource::Fallback || fleet_vessels.is_none();

        Self {
            status: if degraded { "degraded" } else { "ok" }.to_string(),
            service: service.to_string(),
            version: version.to_string(),
            target: Some(snapshot.target.target),
            target_source: Some(source),
            fleet_vessels,
        }
    }
}

/// `GET /health/live`: 200 while the process is up.
pub async fn health_live() -> (StatusCode, Json<HealthStatus>) {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// `GET /health/ready`: always 200 once state exists, since predictions can
/// be served on the fallback target. `status` reports degradation.
pub async fn health_ready(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let status =
        HealthStatus::from_state(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &state);
    (StatusCode::OK, Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fallback_state, test_state};

    #[test]
    fn alive_omits_readiness_fields() {
        let json = serde_json::to_string(&HealthStatus::alive("svc", "0.1.0")).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(!json.contains("target"));
    }

    #[test]
    fn loaded_state_is_ok() {
        let status = HealthStatus::from_state("svc", "0.1.0", &test_state());
        assert_eq!(status.status, "ok");
        assert_eq!(status.target_source, Some(TargetSource::Loaded));
        assert_eq!(status.fleet_vessels, Some(4));
    }

    #[test]
    fn fallback_state_is_degraded() {
        let status = HealthStatus::from_state("svc", "0.1.0", &fallback_state());
        assert_eq!(status.status, "degraded");
        assert_eq!(status.target, Some(89.34));
        assert!(status.fleet_vessels.is_none());
    }
}
