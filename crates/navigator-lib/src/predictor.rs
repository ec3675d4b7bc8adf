//! Serving-time composition: predict CO2, normalize, classify.
//!
//! The CO2 regression model is an injected dependency behind
//! [`Co2Predictor`]; this module only relies on its input/output contract.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::compliance::{classify, ComplianceResult};
use crate::error::{Error, Result};
use crate::fuel::{normalize_fuel, FuelLcvTable, DIESEL, HFO};
use crate::intensity::IntensityFormula;
use crate::target::RegulatoryTarget;
use crate::voyage::VoyageFeatures;

/// Boxed error returned by predictor implementations.
pub type PredictorError = Box<dyn std::error::Error + Send + Sync>;

/// Capability: estimate the CO2 mass (kg) emitted on a voyage.
pub trait Co2Predictor {
    fn predict(&self, features: &VoyageFeatures) -> std::result::Result<f64, PredictorError>;
}

impl<T: Co2Predictor + ?Sized> Co2Predictor for Arc<T> {
    fn predict(&self, features: &VoyageFeatures) -> std::result::Result<f64, PredictorError> {
        (**self).predict(features)
    }
}

impl<T: Co2Predictor + ?Sized> Co2Predictor for Box<T> {
    fn predict(&self, features: &VoyageFeatures) -> std::result::Result<f64, PredictorError> {
        (**self).predict(features)
    }
}

/// HFO carbon conversion factor (kg CO2 per kg fuel).
pub const HFO_CARBON_FACTOR: f64 = 3.114;

/// Marine diesel carbon conversion factor (kg CO2 per kg fuel).
pub const DIESEL_CARBON_FACTOR: f64 = 3.206;

/// Carbon conversion factors (kg CO2 per kg fuel) keyed by fuel type.
///
/// Fuel names are matched case-insensitively. Unknown fuels take the default.
#[derive(Debug, Clone, PartialEq)]
pub struct CarbonFactorTable {
    factors: BTreeMap<String, f64>,
    default_factor: f64,
}

impl CarbonFactorTable {
    /// HFO and diesel factors, with HFO as the default.
    pub fn standard() -> Self {
        Self {
            factors: [(HFO, HFO_CARBON_FACTOR), (DIESEL, DIESEL_CARBON_FACTOR)]
                .into_iter()
                .map(|(fuel, factor)| (normalize_fuel(fuel), factor))
                .collect(),
            default_factor: HFO_CARBON_FACTOR,
        }
    }

    /// Build a custom table. Every factor must be finite and positive.
    pub fn new<I, S>(entries: I, default_factor: f64) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        check_factor("default", default_factor)?;
        let mut factors = BTreeMap::new();
        for (fuel, factor) in entries {
            let fuel = fuel.as_ref();
            if fuel.trim().is_empty() {
                return Err(Error::invalid("fuel_type", "must not be empty"));
            }
            check_factor(fuel, factor)?;
            factors.insert(normalize_fuel(fuel), factor);
        }
        Ok(Self {
            factors,
            default_factor,
        })
    }

    pub fn factor(&self, fuel_type: &str) -> f64 {
        self.factors
            .get(&normalize_fuel(fuel_type))
            .copied()
            .unwrap_or(self.default_factor)
    }

    pub fn default_factor(&self) -> f64 {
        self.default_factor
    }
}

impl Default for CarbonFactorTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn check_factor(fuel: &str, factor: f64) -> Result<()> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(Error::invalid(
            "carbon_factor",
            format!("carbon factor for '{fuel}' must be finite and positive, got {factor}"),
        ));
    }
    Ok(())
}

/// Predictor that multiplies fuel mass by a fixed per-fuel carbon factor.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFactorPredictor {
    factors: CarbonFactorTable,
}

impl EmissionFactorPredictor {
    pub fn new() -> Self {
        Self::with_factors(CarbonFactorTable::standard())
    }

    pub fn with_factors(factors: CarbonFactorTable) -> Self {
        Self { factors }
    }

    /// Carbon factor applied to a fuel type.
    pub fn factor(&self, fuel_type: &str) -> f64 {
        self.factors.factor(fuel_type)
    }
}

impl Default for EmissionFactorPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Co2Predictor for EmissionFactorPredictor {
    fn predict(&self, features: &VoyageFeatures) -> std::result::Result<f64, PredictorError> {
        Ok(features.fuel_consumption * self.factor(&features.fuel_type))
    }
}

/// Full outcome of scoring one voyage. Values are unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoyageDecision {
    pub predicted_co2_kg: f64,
    pub energy_mj: f64,
    pub compliance: ComplianceResult,
}

/// Composition root for serving-time evaluation.
#[derive(Debug, Clone)]
pub struct CompliancePredictor<P> {
    predictor: P,
    formula: IntensityFormula,
    table: FuelLcvTable,
}

impl<P: Co2Predictor> CompliancePredictor<P> {
    /// Energy-normalized evaluation with the standard LCV table.
    pub fn new(predictor: P) -> Self {
        Self {
            predictor,
            formula: IntensityFormula::EnergyNormalized,
            table: FuelLcvTable::standard().clone(),
        }
    }

    pub fn with_formula(mut self, formula: IntensityFormula) -> Self {
        self.formula = formula;
        self
    }

    pub fn with_lcv_table(mut self, table: FuelLcvTable) -> Self {
        self.table = table;
        self
    }

    pub fn formula(&self) -> IntensityFormula {
        self.formula
    }

    /// Score one voyage against `target`.
    ///
    /// Fails outright on the first problem: invalid input, predictor failure,
    /// zero denominator, or a target derived with a different formula.
    pub fn evaluate(
        &self,
        voyage: &VoyageFeatures,
        target: &RegulatoryTarget,
    ) -> Result<VoyageDecision> {
        voyage.validate()?;
        if target.formula != self.formula {
            return Err(Error::invalid(
                "target",
                format!(
                    "target was derived with the {} formula but evaluation uses {}",
                    target.formula, self.formula
                ),
            ));
        }

        let predicted_co2_kg = self
            .predictor
            .predict(voyage)
            .map_err(|err| Error::Predictor {
                message: err.to_string(),
            })?;
        if !predicted_co2_kg.is_finite() || predicted_co2_kg < 0.0 {
            return Err(Error::Predictor {
                message: format!(
                    "prediction must be a finite non-negative mass, got {predicted_co2_kg}"
                ),
            });
        }

        let energy_mj = self
            .table
            .energy_mj(&voyage.fuel_type, voyage.fuel_consumption)?;
        let intensity = self
            .formula
            .apply(predicted_co2_kg, energy_mj, voyage.distance)?;
        let compliance = classify(intensity, target.target)?;

        tracing::debug!(
            ship_type = %voyage.ship_type,
            fuel_type = %voyage.fuel_type,
            predicted_co2_kg,
            ghg_intensity = intensity,
            status = %compliance.compliance_status,
            "voyage evaluated"
        );

        Ok(VoyageDecision {
            predicted_co2_kg,
            energy_mj,
            compliance,
        })
    }
}
