//! Engine configuration.
//!
//! # Environment Variables
//!
//! - `NAVIGATOR_INTENSITY_FORMULA`: `energy` (default) or `distance`
//! - `NAVIGATOR_TARGET_MARGIN`: reduction from the fleet average (default `0.05`)
//! - `NAVIGATOR_SHIP_TYPE_POLICY`: `first-wins` (default) or `strict`
//! - `NAVIGATOR_FALLBACK_TARGET`: target used when none can be loaded (default `89.34`)

use std::env;

use serde::{Deserialize, Serialize};

use crate::aggregate::ShipTypePolicy;
use crate::error::{Error, Result};
use crate::intensity::IntensityFormula;
use crate::target::{validate_margin, DEFAULT_FALLBACK_TARGET, DEFAULT_MARGIN};

pub const ENV_FORMULA: &str = "NAVIGATOR_INTENSITY_FORMULA";
pub const ENV_MARGIN: &str = "NAVIGATOR_TARGET_MARGIN";
pub const ENV_SHIP_TYPE_POLICY: &str = "NAVIGATOR_SHIP_TYPE_POLICY";
pub const ENV_FALLBACK_TARGET: &str = "NAVIGATOR_FALLBACK_TARGET";

/// Settings shared by the offline compliance pass and serving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub formula: IntensityFormula,
    pub margin: f64,
    pub ship_type_policy: ShipTypePolicy,
    pub fallback_target: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            formula: IntensityFormula::EnergyNormalized,
            margin: DEFAULT_MARGIN,
            ship_type_policy: ShipTypePolicy::FirstWins,
            fallback_target: DEFAULT_FALLBACK_TARGET,
        }
    }
}

impl EngineConfig {
    /// Read configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_FORMULA) {
            config.formula = value.parse()?;
        }
        if let Some(value) = lookup(ENV_MARGIN) {
            config.margin = parse_number(ENV_MARGIN, &value)?;
        }
        if let Some(value) = lookup(ENV_SHIP_TYPE_POLICY) {
            config.ship_type_policy = value.parse()?;
        }
        if let Some(value) = lookup(ENV_FALLBACK_TARGET) {
            config.fallback_target = parse_number(ENV_FALLBACK_TARGET, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_margin(self.margin)?;
        if !self.fallback_target.is_finite() || self.fallback_target <= 0.0 {
            return Err(Error::invalid(
                "fallback_target",
                format!("must be finite and positive, got {}", self.fallback_target),
            ));
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::invalid(key, format!("'{value}' is not a number")))
}
