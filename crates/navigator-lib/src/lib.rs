//! Strategic Navigator compliance engine.
//!
//! This crate turns raw voyage records into energy-normalized GHG intensities,
//! derives a fleet-relative regulatory target, and classifies vessels (or
//! single predicted voyages) as Surplus or Deficit. Higher-level consumers
//! (CLI, HTTP service) should only depend on the functions exported here
//! instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod aggregate;
pub mod artifacts;
pub mod compliance;
pub mod config;
pub mod error;
pub mod fuel;
pub mod intensity;
pub mod output;
pub mod pool;
pub mod predictor;
pub mod report;
pub mod target;
pub mod voyage;

pub use aggregate::{
    aggregate, aggregate_with_table, ExcludedVessel, FleetAggregation, ShipTypeConflict,
    ShipTypePolicy, VesselAggregate,
};
pub use artifacts::{
    load_target_file, run_compliance_pass, ArtifactStore, CompliancePass, TargetArtifact,
    TargetPolicy, TargetResolution, TargetSource, REPORT_FILE, TARGET_FILE,
};
pub use compliance::{classify, ComplianceResult, ComplianceStatus};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use fuel::{energy_mj, FuelLcvTable, DIESEL_LCV_MJ_PER_KG, HFO_LCV_MJ_PER_KG};
pub use intensity::{distance_intensity, energy_intensity, IntensityFormula};
pub use output::{round2, PredictionView};
pub use pool::{pool, PoolMember, PoolResult};
pub use predictor::{
    CarbonFactorTable, Co2Predictor, CompliancePredictor, EmissionFactorPredictor, PredictorError,
    VoyageDecision,
};
pub use report::{
    read_rows_csv, write_rows_csv, FleetReport, FleetReportRow, FleetSummary, ShipTypeBreakdown,
};
pub use target::{
    derive_target, RegulatoryTarget, SharedTarget, DEFAULT_FALLBACK_TARGET, DEFAULT_MARGIN,
};
pub use voyage::{RejectedVoyage, Voyage, VoyageFeatures, VoyageLog};
