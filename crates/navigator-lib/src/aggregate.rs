//! Per-vessel aggregation of voyage records.
//!
//! Voyages are grouped by `ship_id`. Distance, fuel, CO2 and energy are
//! summed per vessel and the vessel intensity is computed from those sums
//! (never as a mean of per-voyage intensities). Output is ordered by
//! `ship_id`, so a fixed voyage set always aggregates to the same sequence.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fuel::FuelLcvTable;
use crate::intensity::IntensityFormula;
use crate::voyage::Voyage;

/// How to treat a vessel whose voyages disagree on `ship_type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShipTypePolicy {
    /// Keep the first voyage's ship type and record the conflict.
    #[default]
    FirstWins,
    /// Exclude the vessel from the aggregation.
    Strict,
}

impl fmt::Display for ShipTypePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipTypePolicy::FirstWins => write!(f, "first-wins"),
            ShipTypePolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for ShipTypePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-wins" | "first_wins" | "first" => Ok(Self::FirstWins),
            "strict" => Ok(Self::Strict),
            other => Err(Error::invalid(
                "ship_type_policy",
                format!("expected 'first-wins' or 'strict', got '{other}'"),
            )),
        }
    }
}

/// One row per vessel, summed across its voyages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselAggregate {
    pub ship_id: String,
    pub ship_type: String,
    pub voyages: usize,
    pub distance: f64,
    pub fuel_consumption: f64,
    pub co2_emissions: f64,
    pub energy_mj: f64,
    /// `None` when the selected denominator summed to zero.
    pub ghg_intensity: Option<f64>,
}

impl VesselAggregate {
    /// Whether the vessel can take part in target derivation.
    pub fn has_intensity(&self) -> bool {
        self.ghg_intensity.is_some()
    }
}

/// A vessel seen with more than one ship type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipTypeConflict {
    pub ship_id: String,
    pub kept: String,
    pub conflicting: String,
}

/// A vessel dropped from the aggregation, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedVessel {
    pub ship_id: String,
    pub reason: String,
}

/// Result of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FleetAggregation {
    pub formula: IntensityFormula,
    pub vessels: Vec<VesselAggregate>,
    pub conflicts: Vec<ShipTypeConflict>,
    pub excluded: Vec<ExcludedVessel>,
}

impl FleetAggregation {
    /// Vessels whose intensity is defined.
    pub fn scored(&self) -> impl Iterator<Item = &VesselAggregate> {
        self.vessels.iter().filter(|v| v.has_intensity())
    }

    /// Number of vessels whose intensity is undefined.
    pub fn undefined_count(&self) -> usize {
        self.vessels.iter().filter(|v| !v.has_intensity()).count()
    }
}

#[derive(Debug)]
struct Accumulator {
    ship_type: String,
    voyages: usize,
    distance: f64,
    fuel_consumption: f64,
    co2_emissions: f64,
    energy_mj: f64,
    conflict: Option<String>,
}

/// Aggregate voyages into vessels using the standard LCV table.
pub fn aggregate(
    voyages: &[Voyage],
    formula: IntensityFormula,
    policy: ShipTypePolicy,
) -> FleetAggregation {
    aggregate_with_table(voyages, formula, policy, FuelLcvTable::standard())
}

/// Aggregate voyages into vessels using a specific LCV table.
pub fn aggregate_with_table(
    voyages: &[Voyage],
    formula: IntensityFormula,
    policy: ShipTypePolicy,
    table: &FuelLcvTable,
) -> FleetAggregation {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for voyage in voyages {
        // Voyage fuel masses are validated non-negative on construction.
        let energy = voyage.fuel_consumption() * table.lcv(voyage.fuel_type());

        let acc = groups
            .entry(voyage.ship_id())
            .or_insert_with(|| Accumulator {
                ship_type: voyage.ship_type().to_string(),
                voyages: 0,
                distance: 0.0,
                fuel_consumption: 0.0,
                co2_emissions: 0.0,
                energy_mj: 0.0,
                conflict: None,
            });

        if acc.ship_type != voyage.ship_type() && acc.conflict.is_none() {
            tracing::warn!(
                ship_id = voyage.ship_id(),
                kept = %acc.ship_type,
                conflicting = voyage.ship_type(),
                "vessel reports more than one ship type"
            );
            acc.conflict = Some(voyage.ship_type().to_string());
            conflicts.push(ShipTypeConflict {
                ship_id: voyage.ship_id().to_string(),
                kept: acc.ship_type.clone(),
                conflicting: voyage.ship_type().to_string(),
            });
        }

        acc.voyages += 1;
        acc.distance += voyage.distance();
        acc.fuel_consumption += voyage.fuel_consumption();
        acc.co2_emissions += voyage.co2_emissions();
        acc.energy_mj += energy;
    }

    let mut vessels = Vec::with_capacity(groups.len());
    let mut excluded = Vec::new();

    for (ship_id, acc) in groups {
        if let (ShipTypePolicy::Strict, Some(conflicting)) = (policy, &acc.conflict) {
            let err = Error::InconsistentShipType {
                ship_id: ship_id.to_string(),
                first: acc.ship_type.clone(),
                conflicting: conflicting.clone(),
            };
            excluded.push(ExcludedVessel {
                ship_id: ship_id.to_string(),
                reason: err.to_string(),
            });
            continue;
        }

        let ghg_intensity = match formula.apply(acc.co2_emissions, acc.energy_mj, acc.distance) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(ship_id, error = %err, "vessel intensity undefined");
                None
            }
        };

        tracing::debug!(
            ship_id,
            voyages = acc.voyages,
            co2_emissions = acc.co2_emissions,
            energy_mj = acc.energy_mj,
            ghg_intensity = ?ghg_intensity,
            "vessel aggregated"
        );

        vessels.push(VesselAggregate {
            ship_id: ship_id.to_string(),
            ship_type: acc.ship_type,
            voyages: acc.voyages,
            distance: acc.distance,
            fuel_consumption: acc.fuel_consumption,
            co2_emissions: acc.co2_emissions,
            energy_mj: acc.energy_mj,
            ghg_intensity,
        });
    }

    tracing::info!(
        voyages = voyages.len(),
        vessels = vessels.len(),
        excluded = excluded.len(),
        conflicts = conflicts.len(),
        %formula,
        "fleet aggregated"
    );

    FleetAggregation {
        formula,
        vessels,
        conflicts,
        excluded,
    }
}
