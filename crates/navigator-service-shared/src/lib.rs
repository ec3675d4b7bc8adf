//! Shared infrastructure for the Strategic Navigator HTTP service.
//!
//! - [`AppState`]: serving target, fleet report and injected CO2 predictor
//! - [`health`]: liveness/readiness handlers
//! - [`ProblemDetails`]: RFC 9457 error bodies, mapped from engine errors
//! - [`ServiceResponse`]: wrapper for successful responses
//! - [`metrics`]: Prometheus recorder and business counters
//! - [`logging`]: JSON or text structured logging
//! - [`middleware`]: request IDs and HTTP request metrics
//!
//! Handlers stay thin: parse, validate, call `navigator-lib`, format. Engine
//! rules never live here.
//!
//! Enable the `test-utils` feature to use [`test_utils`] from dependent crates.

#![deny(warnings)]

mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_artifacts_reloaded, record_evaluation_failed,
    record_fleet_report_served, record_ghg_intensity, record_pool_evaluated,
    record_voyage_evaluated, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, track_requests, RequestId, REQUEST_ID_HEADER};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST,
    PROBLEM_SERVICE_UNAVAILABLE, PROBLEM_UNDEFINED_INTENSITY, PROBLEM_UPSTREAM_PREDICTOR,
};
pub use request::{PoolRequest, PredictRequest, Validate};
pub use response::ServiceResponse;
pub use state::{AppState, AppStateError, ServingSnapshot, SharedPredictor};
