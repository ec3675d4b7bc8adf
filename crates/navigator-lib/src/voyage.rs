//! Voyage records and CSV ingestion.
//!
//! A [`Voyage`] is validated on construction and immutable afterwards.
//! [`VoyageLog`] loads historical voyages from CSV with skip-and-report
//! semantics: malformed rows are collected in [`VoyageLog::rejected`] and do
//! not abort the load.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_not_blank, Error, Result};

/// One recorded trip of one vessel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Voyage {
    ship_id: String,
    ship_type: String,
    distance: f64,
    fuel_consumption: f64,
    fuel_type: String,
    co2_emissions: f64,
}

impl Voyage {
    /// Validate and build a voyage record.
    pub fn new(
        ship_id: impl Into<String>,
        ship_type: impl Into<String>,
        distance: f64,
        fuel_consumption: f64,
        fuel_type: impl Into<String>,
        co2_emissions: f64,
    ) -> Result<Self> {
        let ship_id = ship_id.into();
        ensure_not_blank("ship_id", &ship_id)?;
        let features = VoyageFeatures {
            ship_type: ship_type.into(),
            distance,
            fuel_consumption,
            fuel_type: fuel_type.into(),
        };
        features.validate()?;
        ensure_non_negative("co2_emissions", co2_emissions)?;

        Ok(Self {
            ship_id: ship_id.trim().to_string(),
            ship_type: features.ship_type.trim().to_string(),
            distance,
            fuel_consumption,
            fuel_type: features.fuel_type.trim().to_string(),
            co2_emissions,
        })
    }

    pub fn ship_id(&self) -> &str {
        &self.ship_id
    }

    pub fn ship_type(&self) -> &str {
        &self.ship_type
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Fuel burned on the voyage, in kilograms.
    pub fn fuel_consumption(&self) -> f64 {
        self.fuel_consumption
    }

    pub fn fuel_type(&self) -> &str {
        &self.fuel_type
    }

    /// CO2 emitted on the voyage, in kilograms.
    pub fn co2_emissions(&self) -> f64 {
        self.co2_emissions
    }

    /// The predictor feature tuple for this voyage.
    pub fn features(&self) -> VoyageFeatures {
        VoyageFeatures {
            ship_type: self.ship_type.clone(),
            distance: self.distance,
            fuel_consumption: self.fuel_consumption,
            fuel_type: self.fuel_type.clone(),
        }
    }
}

/// Serving-time voyage description: everything except the CO2 mass, which
/// the predictor supplies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoyageFeatures {
    pub ship_type: String,
    pub distance: f64,
    pub fuel_consumption: f64,
    pub fuel_type: String,
}

impl VoyageFeatures {
    pub fn new(
        ship_type: impl Into<String>,
        distance: f64,
        fuel_consumption: f64,
        fuel_type: impl Into<String>,
    ) -> Self {
        Self {
            ship_type: ship_type.into(),
            distance,
            fuel_consumption,
            fuel_type: fuel_type.into(),
        }
    }

    /// Check categorical fields are present and numeric fields are finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        ensure_not_blank("ship_type", &self.ship_type)?;
        ensure_not_blank("fuel_type", &self.fuel_type)?;
        ensure_non_negative("distance", self.distance)?;
        ensure_non_negative("fuel_consumption", self.fuel_consumption)?;
        Ok(())
    }
}

/// A CSV row that could not be turned into a [`Voyage`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedVoyage {
    /// 1-based line number in the source file (the header is line 1).
    pub row: u64,
    pub ship_id: Option<String>,
    pub reason: String,
}

/// Voyages loaded from a CSV source, with the rows that were skipped.
#[derive(Debug, Clone, Default)]
pub struct VoyageLog {
    pub voyages: Vec<Voyage>,
    pub rejected: Vec<RejectedVoyage>,
    source: Option<PathBuf>,
}

const COLUMNS: &[(&str, &[&str])] = &[
    ("ship_id", &["ship_id", "shipid", "vessel_id", "id"]),
    ("ship_type", &["ship_type", "shiptype", "vessel_type"]),
    ("distance", &["distance", "distance_nm", "distance_km"]),
    (
        "fuel_consumption",
        &["fuel_consumption", "fuel_consumption_kg", "fuel_kg"],
    ),
    ("fuel_type", &["fuel_type", "fueltype"]),
    (
        "co2_emissions",
        &["co2_emissions", "co2_emissions_kg", "co2_kg", "co2"],
    ),
];

impl VoyageLog {
    /// Load voyages from a CSV file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let mut log = Self::from_reader(file)?;
        log.source = Some(path.to_path_buf());
        Ok(log)
    }

    /// Load voyages from any CSV reader.
    ///
    /// Column headers are matched case-insensitively against a set of
    /// synonyms (`CO2_emissions`, `co2_kg`, ...). A missing required column
    /// fails the whole load; a bad row is only skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::Fields)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|err| Error::VoyageData {
                message: format!("failed to read voyage headers: {err}"),
            })?
            .clone();
        let index = column_index(&headers)?;

        let mut voyages = Vec::new();
        let mut rejected = Vec::new();
        let mut last_line: u64 = 1;

        for record in csv_reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    let row = err.position().map_or(last_line + 1, |p| p.line());
                    last_line = row;
                    rejected.push(RejectedVoyage {
                        row,
                        ship_id: None,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            let row = record.position().map_or(last_line + 1, |p| p.line());
            last_line = row;

            match parse_record(&record, &index) {
                Ok(voyage) => voyages.push(voyage),
                Err(err) => {
                    let ship_id = Some(field(&record, &index, "ship_id"))
                        .filter(|s| !s.is_empty())
                        .map(str::to_string);
                    tracing::warn!(row, ship_id = ?ship_id, error = %err, "skipping voyage row");
                    rejected.push(RejectedVoyage {
                        row,
                        ship_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            voyages = voyages.len(),
            rejected = rejected.len(),
            "voyage log loaded"
        );

        Ok(Self {
            voyages,
            rejected,
            source: None,
        })
    }

    /// Path the log was read from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn normalize_header(header: &str) -> String {
    header
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

fn column_index(headers: &StringRecord) -> Result<BTreeMap<&'static str, usize>> {
    let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
    let mut index = BTreeMap::new();

    for (canonical, synonyms) in COLUMNS {
        if let Some(position) = synonyms
            .iter()
            .find_map(|alt| normalized.iter().position(|h| h == alt))
        {
            index.insert(*canonical, position);
        }
    }

    let missing: Vec<&str> = COLUMNS
        .iter()
        .map(|(canonical, _)| *canonical)
        .filter(|c| !index.contains_key(c))
        .collect();

    if !missing.is_empty() {
        return Err(Error::VoyageData {
            message: format!(
                "missing required columns: {}. Available: {}",
                missing.join(", "),
                headers.iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    Ok(index)
}

fn field<'a>(
    record: &'a StringRecord,
    index: &BTreeMap<&'static str, usize>,
    name: &'static str,
) -> &'a str {
    index
        .get(name)
        .and_then(|&i| record.get(i))
        .unwrap_or_default()
}

fn number(
    record: &StringRecord,
    index: &BTreeMap<&'static str, usize>,
    name: &'static str,
) -> Result<f64> {
    let raw = field(record, index, name);
    raw.parse::<f64>()
        .map_err(|_| Error::invalid(name, format!("'{raw}' is not a number")))
}

fn parse_record(record: &StringRecord, index: &BTreeMap<&'static str, usize>) -> Result<Voyage> {
    Voyage::new(
        field(record, index, "ship_id"),
        field(record, index, "ship_type"),
        number(record, index, "distance")?,
        number(record, index, "fuel_consumption")?,
        field(record, index, "fuel_type"),
        number(record, index, "co2_emissions")?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn voyage_rejects_negative_and_blank_fields() {
        assert!(Voyage::new("S1", "Tanker", -1.0, 10.0, "HFO", 5.0).is_err());
        assert!(Voyage::new("S1", "Tanker", 1.0, f64::NAN, "HFO", 5.0).is_err());
        assert!(Voyage::new(" ", "Tanker", 1.0, 10.0, "HFO", 5.0).is_err());
        assert!(Voyage::new("S1", "Tanker", 1.0, 10.0, "", 5.0).is_err());
        assert!(Voyage::new("S1", "Tanker", 1.0, 10.0, "HFO", -5.0).is_err());
    }

    #[test]
    fn voyage_trims_categories() {
        let voyage = Voyage::new(" S1 ", " Tanker", 1.0, 10.0, "HFO ", 5.0).unwrap();
        assert_eq!(voyage.ship_id(), "S1");
        assert_eq!(voyage.ship_type(), "Tanker");
        assert_eq!(voyage.fuel_type(), "HFO");
    }

    #[test]
    fn reads_original_dataset_headers() {
        let csv = "ship_id,ship_type,route_id,month,distance,fuel_type,fuel_consumption,CO2_emissions\n\
                   NG001,Oil Service Boat,Warri-Bonny,January,132.26,HFO,3779.77,10625.76\n";
        let log = VoyageLog::from_reader(Cursor::new(csv)).expect("parses");
        assert_eq!(log.voyages.len(), 1);
        let voyage = &log.voyages[0];
        assert_eq!(voyage.ship_id(), "NG001");
        assert_eq!(voyage.fuel_consumption(), 3779.77);
        assert_eq!(voyage.co2_emissions(), 10625.76);
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let csv = "ship_id,ship_type,distance,fuel_consumption,fuel_type,co2_emissions\n\
                   S1,Tanker,100,50,HFO,150\n\
                   S2,Tanker,abc,50,HFO,150\n\
                   S3,Tanker,100,-5,HFO,150\n\
                   S4,Tanker,100,50,Diesel,160\n";
        let log = VoyageLog::from_reader(Cursor::new(csv)).expect("parses");
        assert_eq!(log.voyages.len(), 2);
        assert_eq!(log.rejected.len(), 2);
        assert_eq!(log.rejected[0].row, 3);
        assert_eq!(log.rejected[0].ship_id.as_deref(), Some("S2"));
        assert!(log.rejected[1].reason.contains("fuel_consumption"));
    }

    #[test]
    fn rejected_rows_report_source_lines() {
        let csv = concat!(
            "ship_id,ship_type,distance,fuel_consumption,fuel_type,co2_emissions\n",
            "S1,\"Oil Service\nBoat\",100,50,HFO,150\n",
            "\n",
            "S2,Tanker,abc,50,HFO,150\n",
        );
        let log = VoyageLog::from_reader(Cursor::new(csv)).expect("parses");
        assert_eq!(log.voyages.len(), 1);
        assert_eq!(log.rejected.len(), 1);
        assert_eq!(log.rejected[0].row, 5);
        assert_eq!(log.rejected[0].ship_id.as_deref(), Some("S2"));
    }

    #[test]
    fn missing_column_fails_the_load() {
        let csv = "ship_id,ship_type,distance,fuel_type,co2_emissions\nS1,Tanker,1,HFO,1\n";
        let err = VoyageLog::from_reader(Cursor::new(csv)).expect_err("missing column");
        assert!(err.to_string().contains("fuel_consumption"));
    }
}
