//! GHG intensity formulas.
//!
//! Two variants are supported and they are not numerically interchangeable:
//!
//! - [`IntensityFormula::EnergyNormalized`]: `co2_kg * 1000 / energy_mj` (gCO2/MJ)
//! - [`IntensityFormula::DistanceNormalized`]: `co2_kg / distance` (CO2 per distance unit)
//!
//! Values are never rounded here; rounding happens only when results are
//! rendered for display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Grams per kilogram.
const GRAMS_PER_KG: f64 = 1000.0;

/// Selects which denominator normalizes CO2 mass into an intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityFormula {
    /// gCO2 per MJ of fuel energy.
    #[default]
    EnergyNormalized,
    /// CO2 per unit of distance sailed.
    DistanceNormalized,
}

impl IntensityFormula {
    /// Compute the intensity from CO2 mass and the two candidate denominators.
    pub fn apply(self, co2_kg: f64, energy_mj: f64, distance: f64) -> Result<f64> {
        match self {
            IntensityFormula::EnergyNormalized => energy_intensity(co2_kg, energy_mj),
            IntensityFormula::DistanceNormalized => distance_intensity(co2_kg, distance),
        }
    }

    /// Name of the denominator this formula divides by.
    pub fn denominator(self) -> &'static str {
        match self {
            IntensityFormula::EnergyNormalized => "energy",
            IntensityFormula::DistanceNormalized => "distance",
        }
    }

    /// Display unit of the resulting intensity.
    pub fn unit(self) -> &'static str {
        match self {
            IntensityFormula::EnergyNormalized => "gCO2/MJ",
            IntensityFormula::DistanceNormalized => "kgCO2/distance",
        }
    }
}

impl fmt::Display for IntensityFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntensityFormula::EnergyNormalized => write!(f, "energy"),
            IntensityFormula::DistanceNormalized => write!(f, "distance"),
        }
    }
}

impl FromStr for IntensityFormula {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "energy" | "energy-normalized" | "energy_normalized" => Ok(Self::EnergyNormalized),
            "distance" | "distance-normalized" | "distance_normalized" => {
                Ok(Self::DistanceNormalized)
            }
            other => Err(Error::invalid(
                "intensity_formula",
                format!("expected 'energy' or 'distance', got '{other}'"),
            )),
        }
    }
}

/// Divide a CO2 quantity by a denominator.
///
/// Returns [`Error::DegenerateDivision`] when the denominator is zero or
/// negative, or so small that the ratio overflows, so callers never observe
/// `inf` or `NaN`.
pub fn intensity(co2: f64, denominator: f64, denominator_name: &'static str) -> Result<f64> {
    if !co2.is_finite() {
        return Err(Error::invalid(
            "co2_emissions",
            format!("must be finite, got {co2}"),
        ));
    }
    if !denominator.is_finite() {
        return Err(Error::invalid(
            denominator_name,
            format!("must be finite, got {denominator}"),
        ));
    }
    if denominator <= 0.0 {
        return Err(Error::DegenerateDivision {
            denominator: denominator_name,
            value: denominator,
        });
    }
    let ratio = co2 / denominator;
    if !ratio.is_finite() {
        return Err(Error::DegenerateDivision {
            denominator: denominator_name,
            value: denominator,
        });
    }
    Ok(ratio)
}

/// gCO2/MJ from kilograms of CO2 and megajoules of fuel energy.
pub fn energy_intensity(co2_kg: f64, energy_mj: f64) -> Result<f64> {
    if !co2_kg.is_finite() {
        return Err(Error::invalid(
            "co2_emissions",
            format!("must be finite, got {co2_kg}"),
        ));
    }
    intensity(co2_kg * GRAMS_PER_KG, energy_mj, "energy")
}

/// CO2 per distance unit.
pub fn distance_intensity(co2_kg: f64, distance: f64) -> Result<f64> {
    intensity(co2_kg, distance, "distance")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_formula_converts_to_grams() {
        let value = energy_intensity(1600.0, 20100.0).unwrap();
        assert!((value - 79.601_990_049_751_24).abs() < 1e-12);
    }

    #[test]
    fn distance_formula_divides_directly() {
        assert_eq!(distance_intensity(1600.0, 1000.0).unwrap(), 1.6);
    }

    #[test]
    fn zero_or_negative_denominator_is_an_error() {
        for denominator in [0.0, -0.0, -5.0] {
            let err = energy_intensity(10.0, denominator).expect_err("degenerate");
            assert!(matches!(
                err,
                Error::DegenerateDivision {
                    denominator: "energy",
                    ..
                }
            ));
        }
        assert!(matches!(
            distance_intensity(10.0, 0.0),
            Err(Error::DegenerateDivision {
                denominator: "distance",
                ..
            })
        ));
    }

    #[test]
    fn tiny_denominator_overflow_is_an_error() {
        assert!(matches!(
            energy_intensity(1e300, 1e-10),
            Err(Error::DegenerateDivision {
                denominator: "energy",
                ..
            })
        ));
        assert!(matches!(
            distance_intensity(10.0, 1e-308),
            Err(Error::DegenerateDivision {
                denominator: "distance",
                ..
            })
        ));
        assert!(distance_intensity(10.0, 1e-300).unwrap().is_finite());
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        assert!(energy_intensity(f64::NAN, 10.0).is_err());
        assert!(energy_intensity(10.0, f64::INFINITY).is_err());
    }

    #[test]
    fn apply_selects_denominator() {
        let energy = IntensityFormula::EnergyNormalized
            .apply(2.0, 1000.0, 4.0)
            .unwrap();
        let distance = IntensityFormula::DistanceNormalized
            .apply(2.0, 1000.0, 4.0)
            .unwrap();
        assert_eq!(energy, 2.0);
        assert_eq!(distance, 0.5);
    }

    #[test]
    fn parses_formula_names() {
        assert_eq!(
            "Energy".parse::<IntensityFormula>().unwrap(),
            IntensityFormula::EnergyNormalized
        );
        assert_eq!(
            "distance-normalized".parse::<IntensityFormula>().unwrap(),
            IntensityFormula::DistanceNormalized
        );
        assert!("tonnage".parse::<IntensityFormula>().is_err());
    }
}
