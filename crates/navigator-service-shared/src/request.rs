//! Request bodies and validation.

use serde::{Deserialize, Serialize};

use navigator_lib::VoyageFeatures;

use crate::ProblemDetails;

/// Request-level validation producing a 400 problem.
pub trait Validate {
    /// `request_id` becomes the problem `instance`. The error is boxed to keep
    /// `Result` small.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

/// Body of `POST /api/predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub ship_type: String,
    pub distance: f64,
    /// Fuel mass in kg.
    pub fuel_consumption: f64,
    pub fuel_type: String,
}

impl PredictRequest {
    pub fn features(&self) -> VoyageFeatures {
        VoyageFeatures::new(
            self.ship_type.trim(),
            self.distance,
            self.fuel_consumption,
            self.fuel_type.trim(),
        )
    }
}

impl Validate for PredictRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        for (name, value) in [("ship_type", &self.ship_type), ("fuel_type", &self.fuel_type)] {
            if value.trim().is_empty() {
                return Err(Box::new(ProblemDetails::bad_request(
                    format!("The '{name}' field is required and cannot be empty"),
                    request_id,
                )));
            }
        }

        for (name, value) in [
            ("distance", self.distance),
            ("fuel_consumption", self.fuel_consumption),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Box::new(ProblemDetails::bad_request(
                    format!("The '{name}' field must be a finite, non-negative number"),
                    request_id,
                )));
            }
        }

        Ok(())
    }
}

/// Body of `POST /api/fleet/pool`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolRequest {
    pub ship_ids: Vec<String>,
}

impl Validate for PoolRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.ship_ids.len() < 2 {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'ship_ids' field must name at least two vessels",
                request_id,
            )));
        }
        if self.ship_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'ship_ids' field cannot contain empty ids",
                request_id,
            )));
        }
        Ok(())
    }
}
