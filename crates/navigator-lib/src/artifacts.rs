//! The compliance pass and the artifacts it hands to the serving side.
//!
//! [`run_compliance_pass`] aggregates, derives the target and builds the
//! report in one go, so the persisted target and report always describe the
//! same fleet snapshot. [`ArtifactStore`] persists them to a directory and
//! [`TargetPolicy`] resolves the serving target with an explicit fallback.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::aggregate::{aggregate, FleetAggregation};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::intensity::IntensityFormula;
use crate::report::{read_rows_csv, FleetReport, FleetReportRow};
use crate::target::{derive_target, RegulatoryTarget};
use crate::voyage::Voyage;

/// File name of the persisted target.
pub const TARGET_FILE: &str = "target.json";

/// File name of the persisted fleet report.
pub const REPORT_FILE: &str = "compliance_data.csv";

/// Everything produced by one aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompliancePass {
    pub voyages: usize,
    pub aggregation: FleetAggregation,
    pub target: RegulatoryTarget,
    pub report: FleetReport,
}

/// Aggregate voyages, derive the target, and classify every vessel.
pub fn run_compliance_pass(voyages: &[Voyage], config: &EngineConfig) -> Result<CompliancePass> {
    config.validate()?;
    let aggregation = aggregate(voyages, config.formula, config.ship_type_policy);
    let target = derive_target(&aggregation.vessels, config.margin, config.formula)?;
    let report = FleetReport::build(&aggregation, &target)?;

    Ok(CompliancePass {
        voyages: voyages.len(),
        aggregation,
        target,
        report,
    })
}

/// Persisted form of a target, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetArtifact {
    pub target: RegulatoryTarget,
    pub generated_at: DateTime<Utc>,
    pub voyages: usize,
}

/// Read a target artifact from an explicit path.
pub fn load_target_file(path: &Path) -> Result<TargetArtifact> {
    if !path.exists() {
        return Err(Error::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

/// A directory holding `target.json` and `compliance_data.csv`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target_path(&self) -> PathBuf {
        self.root.join(TARGET_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    /// Write the target and report of one pass, creating the directory if needed.
    ///
    /// Both files are staged next to their destination and only renamed into
    /// place once both are fully written. The report is persisted before the
    /// target, so a target on disk never predates the report beside it.
    pub fn save(&self, pass: &CompliancePass) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let mut report_tmp = NamedTempFile::new_in(&self.root)?;
        pass.report.write_csv(BufWriter::new(report_tmp.as_file_mut()))?;
        report_tmp.flush()?;

        let artifact = TargetArtifact {
            target: pass.target,
            generated_at: Utc::now(),
            voyages: pass.voyages,
        };
        let mut target_tmp = NamedTempFile::new_in(&self.root)?;
        {
            let mut writer = BufWriter::new(target_tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &artifact)?;
            writer.flush()?;
        }
        target_tmp.flush()?;

        report_tmp
            .persist(self.report_path())
            .map_err(|err| err.error)?;
        target_tmp
            .persist(self.target_path())
            .map_err(|err| err.error)?;

        tracing::info!(
            dir = %self.root.display(),
            target = pass.target.target,
            vessels = pass.report.rows.len(),
            "compliance artifacts written"
        );
        Ok(())
    }

    pub fn load_target(&self) -> Result<TargetArtifact> {
        load_target_file(&self.target_path())
    }

    pub fn load_report(&self) -> Result<Vec<FleetReportRow>> {
        let path = self.report_path();
        if !path.exists() {
            return Err(Error::ArtifactNotFound { path });
        }
        read_rows_csv(fs::File::open(&path)?)
    }
}

/// Where the serving target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    /// Read from a persisted artifact.
    Loaded,
    /// The configured fallback constant.
    Fallback,
    /// Supplied directly by the caller.
    Explicit,
}

/// A serving target plus its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetResolution {
    pub target: RegulatoryTarget,
    pub source: TargetSource,
}

/// Explicit fallback policy for when no target artifact can be loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPolicy {
    pub fallback: f64,
    pub formula: IntensityFormula,
}

impl TargetPolicy {
    pub fn new(fallback: f64, formula: IntensityFormula) -> Self {
        Self { fallback, formula }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.fallback_target, config.formula)
    }

    /// The fallback target itself.
    pub fn fallback_target(&self) -> Result<TargetResolution> {
        Ok(TargetResolution {
            target: RegulatoryTarget::fixed(self.fallback, self.formula)?,
            source: TargetSource::Fallback,
        })
    }

    /// Load the target from `store`, or use the fallback when it cannot be read
    /// or was derived with a different intensity formula.
    pub fn resolve(&self, store: &ArtifactStore) -> Result<TargetResolution> {
        match store.load_target() {
            Ok(artifact) if artifact.target.formula == self.formula => {
                tracing::info!(
                    target = artifact.target.target,
                    generated_at = %artifact.generated_at,
                    "loaded regulatory target"
                );
                Ok(TargetResolution {
                    target: artifact.target,
                    source: TargetSource::Loaded,
                })
            }
            Ok(artifact) => {
                tracing::warn!(
                    stored = %artifact.target.formula,
                    configured = %self.formula,
                    fallback = self.fallback,
                    "stored target uses a different formula, using fallback"
                );
                self.fallback_target()
            }
            Err(err) => {
                tracing::warn!(error = %err, fallback = self.fallback, "using fallback target");
                self.fallback_target()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn voyages() -> Vec<Voyage> {
        vec![
            Voyage::new("A", "Tanker", 100.0, 100.0, "HFO", 300.0).unwrap(),
            Voyage::new("A", "Tanker", 50.0, 50.0, "HFO", 160.0).unwrap(),
            Voyage::new("B", "Ferry", 100.0, 100.0, "Diesel", 330.0).unwrap(),
        ]
    }

    #[test]
    fn pass_is_reproducible() {
        let config = EngineConfig::default();
        let first = run_compliance_pass(&voyages(), &config).unwrap();
        let second = run_compliance_pass(&voyages(), &config).unwrap();
        assert_eq!(first.target.target.to_bits(), second.target.target.to_bits());
        assert_eq!(first.report, second.report);
        assert_eq!(first.voyages, 3);
    }

    #[test]
    fn empty_voyage_set_fails_with_empty_fleet() {
        let err = run_compliance_pass(&[], &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyFleet));
    }

    #[test]
    fn overflowing_vessel_does_not_abort_the_pass() {
        let voyages = vec![
            Voyage::new("A", "Tanker", 100.0, 100.0, "HFO", 300.0).unwrap(),
            Voyage::new("B", "Tug", 1e-308, 1.0, "HFO", 10.0).unwrap(),
        ];
        let config = EngineConfig {
            formula: IntensityFormula::DistanceNormalized,
            ..EngineConfig::default()
        };
        let pass = run_compliance_pass(&voyages, &config).unwrap();
        assert_eq!(pass.target.vessel_count, 1);
        assert_eq!(pass.target.fleet_average, 3.0);
        assert_eq!(pass.report.summary.undefined, 1);
        assert_eq!(pass.report.rows[1].compliance_status, None);
    }

    #[test]
    fn saved_artifacts_load_back() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts"));
        let pass = run_compliance_pass(&voyages(), &EngineConfig::default()).unwrap();
        store.save(&pass).unwrap();

        let artifact = store.load_target().unwrap();
        assert_eq!(artifact.target, pass.target);
        assert_eq!(artifact.voyages, 3);

        let rows = store.load_report().unwrap();
        assert_eq!(rows, pass.report.rows);
    }

    #[test]
    fn save_replaces_both_artifacts_without_leftovers() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let first = run_compliance_pass(&voyages(), &EngineConfig::default()).unwrap();
        store.save(&first).unwrap();

        let second_voyages = vec![Voyage::new("C", "Tug", 10.0, 10.0, "HFO", 40.0).unwrap()];
        let second = run_compliance_pass(&second_voyages, &EngineConfig::default()).unwrap();
        store.save(&second).unwrap();

        assert_eq!(store.load_target().unwrap().target, second.target);
        assert_eq!(store.load_report().unwrap(), second.report.rows);

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, [REPORT_FILE, TARGET_FILE]);
    }

    #[test]
    fn failed_save_leaves_no_artifacts() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        fs::write(&blocker, "not a directory").unwrap();
        let store = ArtifactStore::new(blocker.join("artifacts"));
        let pass = run_compliance_pass(&voyages(), &EngineConfig::default()).unwrap();

        assert!(store.save(&pass).is_err());
        assert!(!store.target_path().exists());
        assert!(!store.report_path().exists());
    }

    #[test]
    fn policy_reports_which_path_was_taken() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let policy = TargetPolicy::from_config(&EngineConfig::default());

        let missing = policy.resolve(&store).unwrap();
        assert_eq!(missing.source, TargetSource::Fallback);
        assert_eq!(missing.target.target, 89.34);

        let pass = run_compliance_pass(&voyages(), &EngineConfig::default()).unwrap();
        store.save(&pass).unwrap();
        let loaded = policy.resolve(&store).unwrap();
        assert_eq!(loaded.source, TargetSource::Loaded);
        assert_eq!(loaded.target, pass.target);
    }

    #[test]
    fn policy_ignores_targets_from_another_formula() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let pass = run_compliance_pass(&voyages(), &EngineConfig::default()).unwrap();
        store.save(&pass).unwrap();

        let policy = TargetPolicy::new(1.5, IntensityFormula::DistanceNormalized);
        let resolution = policy.resolve(&store).unwrap();
        assert_eq!(resolution.source, TargetSource::Fallback);
        assert_eq!(resolution.target.target, 1.5);
    }

    #[test]
    fn corrupt_target_falls_back() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(TARGET_FILE), "not json").unwrap();
        let store = ArtifactStore::new(dir.path());
        let policy = TargetPolicy::from_config(&EngineConfig::default());
        assert_eq!(
            policy.resolve(&store).unwrap().source,
            TargetSource::Fallback
        );
    }

    #[test]
    fn missing_report_is_a_distinct_error() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load_report(),
            Err(Error::ArtifactNotFound { .. })
        ));
    }
}
