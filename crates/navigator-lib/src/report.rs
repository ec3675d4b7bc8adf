//! Fleet compliance report: one row per vessel plus a summary.
//!
//! Undefined numeric fields (vessels whose intensity could not be computed)
//! serialize as an empty string in both CSV and JSON, never as `null`.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::aggregate::FleetAggregation;
use crate::compliance::{classify, ComplianceStatus};
use crate::error::Result;
use crate::output::round2;
use crate::target::RegulatoryTarget;

/// One vessel in the fleet report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetReportRow {
    pub ship_id: String,
    pub ship_type: String,
    pub distance: f64,
    pub fuel_consumption: f64,
    pub co2_emissions: f64,
    pub energy_mj: f64,
    #[serde(default, with = "blank")]
    pub ghg_intensity: Option<f64>,
    #[serde(default, with = "blank")]
    pub compliance_status: Option<ComplianceStatus>,
    #[serde(default, with = "blank")]
    pub compliance_balance: Option<f64>,
}

/// Surplus/deficit split for one ship type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipTypeBreakdown {
    pub ship_type: String,
    pub vessels: usize,
    pub surplus: usize,
    pub deficit: usize,
    pub undefined: usize,
}

/// Fleet-level counts and the benchmark the rows were classified against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub vessels: usize,
    pub surplus: usize,
    pub deficit: usize,
    pub undefined: usize,
    pub excluded: usize,
    /// Percentage of classified vessels in surplus; `0.0` when none are classified.
    pub compliance_rate: f64,
    pub fleet_average: f64,
    pub target: f64,
    /// Ordered by ship type.
    pub by_ship_type: Vec<ShipTypeBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetReport {
    pub summary: FleetSummary,
    pub rows: Vec<FleetReportRow>,
}

impl FleetReport {
    /// Classify every aggregated vessel against `target`.
    pub fn build(aggregation: &FleetAggregation, target: &RegulatoryTarget) -> Result<Self> {
        let mut rows = Vec::with_capacity(aggregation.vessels.len());
        let (mut surplus, mut deficit, mut undefined) = (0, 0, 0);
        let mut by_type: BTreeMap<&str, ShipTypeBreakdown> = BTreeMap::new();

        for vessel in &aggregation.vessels {
            let compliance = match vessel.ghg_intensity {
                Some(intensity) => Some(classify(intensity, target.target)?),
                None => None,
            };
            let breakdown = by_type
                .entry(vessel.ship_type.as_str())
                .or_insert_with(|| ShipTypeBreakdown {
                    ship_type: vessel.ship_type.clone(),
                    vessels: 0,
                    surplus: 0,
                    deficit: 0,
                    undefined: 0,
                });
            breakdown.vessels += 1;
            match compliance.map(|c| c.compliance_status) {
                Some(ComplianceStatus::Surplus) => {
                    surplus += 1;
                    breakdown.surplus += 1;
                }
                Some(ComplianceStatus::Deficit) => {
                    deficit += 1;
                    breakdown.deficit += 1;
                }
                None => {
                    undefined += 1;
                    breakdown.undefined += 1;
                }
            }

            rows.push(FleetReportRow {
                ship_id: vessel.ship_id.clone(),
                ship_type: vessel.ship_type.clone(),
                distance: vessel.distance,
                fuel_consumption: vessel.fuel_consumption,
                co2_emissions: vessel.co2_emissions,
                energy_mj: vessel.energy_mj,
                ghg_intensity: vessel.ghg_intensity,
                compliance_status: compliance.map(|c| c.compliance_status),
                compliance_balance: compliance.map(|c| c.compliance_balance),
            });
        }

        let classified = surplus + deficit;
        let compliance_rate = if classified == 0 {
            0.0
        } else {
            surplus as f64 * 100.0 / classified as f64
        };

        tracing::info!(
            surplus,
            deficit,
            undefined,
            compliance_rate,
            "fleet report built"
        );

        Ok(Self {
            summary: FleetSummary {
                vessels: rows.len(),
                surplus,
                deficit,
                undefined,
                excluded: aggregation.excluded.len(),
                compliance_rate,
                fleet_average: target.fleet_average,
                target: target.target,
                by_ship_type: by_type.into_values().collect(),
            },
            rows,
        })
    }

    /// Write the rows as CSV with a header line.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        write_rows_csv(&self.rows, writer)
    }

    /// Plain-text table of the report, rounded for display.
    pub fn render_table(&self, unit: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Fleet average: {:.2} {unit}  Target: {:.2} {unit}\n",
            self.summary.fleet_average, self.summary.target
        ));
        out.push_str(&format!(
            "Vessels: {}  Surplus: {}  Deficit: {}  Undefined: {}  Excluded: {}\n",
            self.summary.vessels,
            self.summary.surplus,
            self.summary.deficit,
            self.summary.undefined,
            self.summary.excluded
        ));
        out.push_str(&format!(
            "Compliance rate: {:.1}%\n",
            self.summary.compliance_rate
        ));
        for breakdown in &self.summary.by_ship_type {
            out.push_str(&format!(
                "  {:<20} surplus {}  deficit {}  undefined {}\n",
                breakdown.ship_type, breakdown.surplus, breakdown.deficit, breakdown.undefined
            ));
        }
        out.push_str(&format!(
            "{:<12} {:<20} {:>12} {:>10} {:>10}\n",
            "Ship", "Type", "Intensity", "Balance", "Status"
        ));
        for row in &self.rows {
            let intensity = row
                .ghg_intensity
                .map(|v| format!("{:.2}", round2(v)))
                .unwrap_or_else(|| "-".to_string());
            let balance = row
                .compliance_balance
                .map(|v| format!("{:+.2}", round2(v)))
                .unwrap_or_else(|| "-".to_string());
            let status = row
                .compliance_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "undefined".to_string());
            out.push_str(&format!(
                "{:<12} {:<20} {:>12} {:>10} {:>10}\n",
                row.ship_id, row.ship_type, intensity, balance, status
            ));
        }
        out
    }
}

/// Write report rows as CSV with a header line.
pub fn write_rows_csv<W: Write>(rows: &[FleetReportRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read report rows previously written by [`write_rows_csv`].
pub fn read_rows_csv<R: Read>(reader: R) -> Result<Vec<FleetReportRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Serde adapter: `None` <-> `""`.
mod blank {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Field<T> {
            Value(T),
            Text(String),
        }

        match Field::<T>::deserialize(deserializer)? {
            Field::Value(value) => Ok(Some(value)),
            Field::Text(text) if text.trim().is_empty() => Ok(None),
            Field::Text(text) => Err(D::Error::custom(format!("unexpected value '{text}'"))),
        }
    }
}
