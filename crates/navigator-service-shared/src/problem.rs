//! RFC 9457 Problem Details for HTTP APIs.
//!
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use navigator_lib::Error as LibError;

/// Malformed or out-of-domain request fields.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Intensity cannot be computed because its denominator is zero.
pub const PROBLEM_UNDEFINED_INTENSITY: &str = "/problems/undefined-intensity";

/// The injected CO2 predictor failed or returned an unusable value.
pub const PROBLEM_UPSTREAM_PREDICTOR: &str = "/problems/upstream-predictor";

/// Artifacts the endpoint depends on are not loaded.
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "/problems/service-unavailable";

pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// RFC 9457 problem body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// Relative URI identifying the problem type.
    #[serde(rename = "type")]
    pub type_uri: String,

    pub title: String,

    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Request ID of the failing call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Engine error label (`Error::kind`), when the problem came from the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            kind: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// 400 for invalid request fields.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 422 for a voyage whose intensity is undefined.
    pub fn undefined_intensity(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UNDEFINED_INTENSITY,
            "Undefined Intensity",
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 502 for predictor failures.
    pub fn upstream_predictor(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UPSTREAM_PREDICTOR,
            "Predictor Failed",
            StatusCode::BAD_GATEWAY,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 503 when required artifacts are missing.
    pub fn service_unavailable(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_SERVICE_UNAVAILABLE,
            "Service Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.title, detail),
            None => write!(f, "{}", self.title),
        }
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(&self)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
        );
        response
    }
}

/// Map an engine error to its problem type.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    let problem = match error {
        LibError::InvalidInput { .. } => ProblemDetails::bad_request(error.to_string(), request_id),
        LibError::DegenerateDivision { .. } => {
            ProblemDetails::undefined_intensity(error.to_string(), request_id)
        }
        LibError::Predictor { .. } => {
            ProblemDetails::upstream_predictor(error.to_string(), request_id)
        }
        LibError::EmptyFleet | LibError::ArtifactNotFound { .. } => {
            ProblemDetails::service_unavailable(error.to_string(), request_id)
        }
        _ => ProblemDetails::internal_error(error.to_string(), request_id),
    };
    problem.with_kind(error.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use navigator_lib::Error;
    use std::path::PathBuf;

    #[test]
    fn serializes_type_and_instance() {
        let problem = ProblemDetails::bad_request("distance must be non-negative", "req-1");
        let json = serde_json::to_value(&problem).unwrap();

        assert_eq!(json["type"], PROBLEM_INVALID_REQUEST);
        assert_eq!(json["status"], 400);
        assert_eq!(json["instance"], "req-1");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn engine_errors_map_to_distinct_statuses() {
        let cases = [
            (Error::invalid("distance", "must be non-negative"), 400),
            (
                Error::DegenerateDivision {
                    denominator: "energy",
                    value: 0.0,
                },
                422,
            ),
            (
                Error::Predictor {
                    message: "model offline".to_string(),
                },
                502,
            ),
            (Error::EmptyFleet, 503),
            (
                Error::ArtifactNotFound {
                    path: PathBuf::from("/tmp/compliance_data.csv"),
                },
                503,
            ),
        ];

        for (error, status) in cases {
            let problem = from_lib_error(&error, "req-2");
            assert_eq!(problem.status, status, "{error}");
            assert_eq!(problem.kind.as_deref(), Some(error.kind()));
            assert_eq!(problem.instance.as_deref(), Some("req-2"));
        }
    }

    #[test]
    fn response_uses_problem_content_type() {
        let response = ProblemDetails::upstream_predictor("boom", "req-3").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PROBLEM_CONTENT_TYPE
        );
    }
}
