//! Fuel energy content and mass-to-energy normalization.
//!
//! Energy (MJ) = fuel mass (kg) × lower calorific value (MJ/kg). Lookups for
//! fuel types missing from the table fall back to the HFO value instead of
//! failing.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Heavy Fuel Oil category label.
pub const HFO: &str = "HFO";

/// Marine diesel / MGO category label.
pub const DIESEL: &str = "Diesel";

/// Lower calorific value of HFO in MJ/kg (ISO 8217).
pub const HFO_LCV_MJ_PER_KG: f64 = 40.2;

/// Lower calorific value of marine diesel in MJ/kg.
pub const DIESEL_LCV_MJ_PER_KG: f64 = 42.7;

static STANDARD_TABLE: Lazy<FuelLcvTable> = Lazy::new(|| {
    FuelLcvTable::from_constants(
        &[(HFO, HFO_LCV_MJ_PER_KG), (DIESEL, DIESEL_LCV_MJ_PER_KG)],
        HFO_LCV_MJ_PER_KG,
    )
});

/// Mapping from fuel-type category to lower calorific value (MJ/kg).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelLcvTable {
    entries: BTreeMap<String, f64>,
    default_lcv: f64,
}

impl FuelLcvTable {
    /// The process-wide table used by training and serving.
    pub fn standard() -> &'static FuelLcvTable {
        &STANDARD_TABLE
    }

    /// Build a custom table. Every LCV, including the default, must be finite and positive.
    pub fn new<I, S>(entries: I, default_lcv: f64) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        check_lcv("default", default_lcv)?;
        let mut map = BTreeMap::new();
        for (fuel, lcv) in entries {
            let fuel = fuel.as_ref();
            if fuel.trim().is_empty() {
                return Err(Error::invalid("fuel_type", "must not be empty"));
            }
            check_lcv(fuel, lcv)?;
            map.insert(normalize_fuel(fuel), lcv);
        }
        Ok(Self {
            entries: map,
            default_lcv,
        })
    }

    /// Build a table from compile-time constants without validation.
    pub(crate) fn from_constants(entries: &[(&str, f64)], default_lcv: f64) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(fuel, lcv)| (normalize_fuel(fuel), *lcv))
                .collect(),
            default_lcv,
        }
    }

    /// LCV for the fuel type, or the default (HFO) value when unknown.
    pub fn lcv(&self, fuel_type: &str) -> f64 {
        self.entries
            .get(&normalize_fuel(fuel_type))
            .copied()
            .unwrap_or(self.default_lcv)
    }

    /// Whether the fuel type has its own table entry.
    pub fn is_known(&self, fuel_type: &str) -> bool {
        self.entries.contains_key(&normalize_fuel(fuel_type))
    }

    /// Value applied to unknown fuel types.
    pub fn default_lcv(&self) -> f64 {
        self.default_lcv
    }

    /// Convert a fuel mass into energy content.
    ///
    /// Negative or non-finite masses are rejected rather than clamped.
    pub fn energy_mj(&self, fuel_type: &str, fuel_mass_kg: f64) -> Result<f64> {
        if !fuel_mass_kg.is_finite() || fuel_mass_kg < 0.0 {
            return Err(Error::invalid(
                "fuel_consumption",
                format!("fuel mass must be finite and non-negative, got {fuel_mass_kg}"),
            ));
        }
        if !self.is_known(fuel_type) {
            tracing::debug!(
                fuel_type,
                default_lcv = self.default_lcv,
                "unknown fuel type, applying default LCV"
            );
        }
        Ok(fuel_mass_kg * self.lcv(fuel_type))
    }
}

impl Default for FuelLcvTable {
    fn default() -> Self {
        Self::standard().clone()
    }
}

/// Energy content (MJ) of a fuel mass using the standard LCV table.
pub fn energy_mj(fuel_type: &str, fuel_mass_kg: f64) -> Result<f64> {
    FuelLcvTable::standard().energy_mj(fuel_type, fuel_mass_kg)
}

fn check_lcv(fuel: &str, lcv: f64) -> Result<()> {
    if !lcv.is_finite() || lcv <= 0.0 {
        return Err(Error::invalid(
            "lcv",
            format!("LCV for '{fuel}' must be finite and positive, got {lcv}"),
        ));
    }
    Ok(())
}

pub(crate) fn normalize_fuel(fuel_type: &str) -> String {
    fuel_type.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_fuels_multiply_exactly() {
        assert_eq!(energy_mj(HFO, 500.0).unwrap(), 500.0 * 40.2);
        assert_eq!(energy_mj(DIESEL, 123.5).unwrap(), 123.5 * 42.7);
    }

    #[test]
    fn unknown_fuel_defaults_to_hfo() {
        assert_eq!(energy_mj("Unknown", 100.0).unwrap(), 4020.0);
        assert!(!FuelLcvTable::standard().is_known("LNG"));
    }

    #[test]
    fn lookup_ignores_case_and_padding() {
        let table = FuelLcvTable::standard();
        assert_eq!(table.lcv(" diesel "), DIESEL_LCV_MJ_PER_KG);
        assert!(table.is_known("hfo"));
    }

    #[test]
    fn negative_mass_is_rejected() {
        let err = energy_mj(HFO, -1.0).expect_err("negative mass rejected");
        assert_eq!(err.kind(), "input_error");
        assert!(energy_mj(HFO, f64::NAN).is_err());
    }

    #[test]
    fn zero_mass_is_zero_energy() {
        assert_eq!(energy_mj(HFO, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn custom_table_rejects_non_positive_lcv() {
        assert!(FuelLcvTable::new([("LNG", 0.0)], 40.2).is_err());
        assert!(FuelLcvTable::new([("LNG", 48.0)], f64::NAN).is_err());

        let table = FuelLcvTable::new([("LNG", 48.0)], 41.0).expect("valid table");
        assert_eq!(table.energy_mj("LNG", 10.0).unwrap(), 480.0);
        assert_eq!(table.energy_mj("Methanol", 10.0).unwrap(), 410.0);
    }
}
