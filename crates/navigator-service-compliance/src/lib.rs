//! Strategic Navigator compliance HTTP service.
//!
//! # Endpoints
//!
//! - `GET /` - service banner
//! - `GET /api/fleet` - per-vessel compliance report
//! - `POST /api/fleet/pool` - net compliance balance of a group of vessels
//! - `POST /api/predict` - predict and classify one voyage
//! - `GET /api/target` - regulatory target in force and its source
//! - `POST /api/admin/reload` - re-read the artifact directory
//! - `GET /metrics` - Prometheus metrics
//! - `GET /health/live`, `GET /health/ready` - liveness and readiness

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use navigator_lib::{pool, IntensityFormula, PoolResult, PredictionView, TargetSource};
use navigator_service_shared::{
    from_lib_error, health_live, health_ready, metrics_handler, record_artifacts_reloaded,
    record_evaluation_failed, record_fleet_report_served, record_ghg_intensity,
    record_pool_evaluated, record_voyage_evaluated, track_requests, AppState, PoolRequest,
    PredictRequest, ProblemDetails, RequestId, ServiceResponse, ServingSnapshot, Validate,
};

/// Build the service router over `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/fleet", get(fleet_handler))
        .route("/api/fleet/pool", post(pool_handler))
        .route("/api/predict", post(predict_handler))
        .route("/api/target", get(target_handler))
        .route("/api/admin/reload", post(reload_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(middleware::from_fn(track_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct Banner {
    message: &'static str,
    status: &'static str,
}

async fn root_handler() -> Json<Banner> {
    Json(Banner {
        message: "Strategic Navigator API",
        status: "Active",
    })
}

async fn fleet_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match state.fleet() {
        Some(rows) => {
            record_fleet_report_served();
            info!(request_id = %request_id, vessels = rows.len(), "serving fleet report");
            Json(rows.as_slice()).into_response()
        }
        None => {
            warn!(request_id = %request_id, "fleet report requested but not loaded");
            fleet_unavailable(&request_id)
        }
    }
}

fn fleet_unavailable(request_id: &RequestId) -> Response {
    ProblemDetails::service_unavailable(
        "No fleet compliance report is loaded; run the compliance pass first",
        request_id.as_str(),
    )
    .into_response()
}

async fn pool_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<PoolRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return ProblemDetails::bad_request(rejection.body_text(), request_id.as_str())
                .into_response();
        }
    };
    if let Err(problem) = request.validate(request_id.as_str()) {
        return problem.into_response();
    }

    let Some(rows) = state.fleet() else {
        warn!(request_id = %request_id, "pool requested but no fleet report is loaded");
        return fleet_unavailable(&request_id);
    };

    let result: PoolResult = match pool(&rows, &request.ship_ids) {
        Ok(result) => result,
        Err(err) => {
            warn!(request_id = %request_id, error = %err, "pool rejected");
            return from_lib_error(&err, request_id.as_str()).into_response();
        }
    };

    record_pool_evaluated(result.compliant);
    info!(
        request_id = %request_id,
        members = result.members.len(),
        net_balance = result.net_balance,
        compliant = result.compliant,
        "pool evaluated"
    );

    ServiceResponse::new(result.rounded())
        .with_request_id(request_id.as_str())
        .into_response()
}

async fn predict_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            record_evaluation_failed("validation_error");
            return ProblemDetails::bad_request(rejection.body_text(), request_id.as_str())
                .into_response();
        }
    };

    if let Err(problem) = request.validate(request_id.as_str()) {
        record_evaluation_failed("validation_error");
        return problem.into_response();
    }

    let decision = match state.evaluate(&request.features()) {
        Ok(decision) => decision,
        Err(err) => {
            warn!(request_id = %request_id, kind = err.kind(), error = %err, "evaluation failed");
            record_evaluation_failed(err.kind());
            return from_lib_error(&err, request_id.as_str()).into_response();
        }
    };

    let status = decision.compliance.compliance_status;
    record_voyage_evaluated(status);
    record_ghg_intensity(decision.compliance.ghg_intensity, state.config().formula);
    info!(
        request_id = %request_id,
        ship_type = %request.ship_type,
        status = %status,
        "voyage evaluated"
    );

    ServiceResponse::new(PredictionView::from(&decision))
        .with_request_id(request_id.as_str())
        .into_response()
}

#[derive(Debug, Serialize)]
struct TargetView {
    target: f64,
    fleet_average: f64,
    vessel_count: usize,
    margin: f64,
    formula: IntensityFormula,
    unit: &'static str,
    source: TargetSource,
}

impl From<&ServingSnapshot> for TargetView {
    fn from(snapshot: &ServingSnapshot) -> Self {
        let target = &snapshot.target;
        Self {
            target: target.target,
            fleet_average: target.fleet_average,
            vessel_count: target.vessel_count,
            margin: target.margin,
            formula: target.formula,
            unit: target.formula.unit(),
            source: snapshot.source,
        }
    }
}

async fn target_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ServiceResponse<TargetView> {
    ServiceResponse::new(TargetView::from(state.snapshot().as_ref()))
        .with_request_id(request_id.as_str())
}

#[derive(Debug, Serialize)]
struct ReloadView {
    #[serde(flatten)]
    target: TargetView,
    fleet_vessels: Option<usize>,
}

async fn reload_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    if !state.can_reload() {
        return ProblemDetails::service_unavailable(
            "Service was not started from an artifact directory; nothing to reload",
            request_id.as_str(),
        )
        .into_response();
    }

    match state.reload() {
        Ok(snapshot) => {
            record_artifacts_reloaded(snapshot.source);
            info!(request_id = %request_id, source = ?snapshot.source, "artifacts reloaded");
            ServiceResponse::new(ReloadView {
                target: TargetView::from(snapshot.as_ref()),
                fleet_vessels: snapshot.fleet.as_ref().map(|rows| rows.len()),
            })
            .with_request_id(request_id.as_str())
            .into_response()
        }
        Err(err) => {
            warn!(request_id = %request_id, error = %err, "artifact reload failed");
            ProblemDetails::internal_error(err.to_string(), request_id.as_str()).into_response()
        }
    }
}
