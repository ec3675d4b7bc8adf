//! Fixtures for handler tests: state built in memory from the shared
//! voyage fixture, and predictor stubs.

use std::path::PathBuf;
use std::sync::Arc;

use navigator_lib::{
    run_compliance_pass, Co2Predictor, EngineConfig, PredictorError, RegulatoryTarget,
    TargetPolicy, TargetResolution, TargetSource, VoyageFeatures, VoyageLog,
};

use crate::state::{AppState, SharedPredictor};

pub const VOYAGE_FIXTURE_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../docs/fixtures/voyages.csv");

pub fn voyage_fixture_path() -> PathBuf {
    PathBuf::from(VOYAGE_FIXTURE_PATH)
}

/// Predictor that always returns the same CO2 mass.
#[derive(Debug, Clone, Copy)]
pub struct FixedPredictor(pub f64);

impl Co2Predictor for FixedPredictor {
    fn predict(&self, _: &VoyageFeatures) -> Result<f64, PredictorError> {
        Ok(self.0)
    }
}

/// Predictor that always fails, as a broken model would.
#[derive(Debug, Clone, Copy)]
pub struct FailingPredictor;

impl Co2Predictor for FailingPredictor {
    fn predict(&self, _: &VoyageFeatures) -> Result<f64, PredictorError> {
        Err("model rejected feature columns".into())
    }
}

/// State from a compliance pass over the fixture, predicting 1600 kg per voyage.
///
/// # Panics
///
/// Panics if the fixture cannot be loaded.
pub fn test_state() -> AppState {
    test_state_with(Arc::new(FixedPredictor(1600.0)))
}

pub fn test_state_with(predictor: SharedPredictor) -> AppState {
    let config = EngineConfig::default();
    let log = VoyageLog::from_path(&voyage_fixture_path())
        .unwrap_or_else(|e| panic!("failed to load {VOYAGE_FIXTURE_PATH}: {e}"));
    let pass = run_compliance_pass(&log.voyages, &config)
        .unwrap_or_else(|e| panic!("fixture compliance pass failed: {e}"));

    AppState::from_parts(
        config,
        TargetResolution {
            target: pass.target,
            source: TargetSource::Loaded,
        },
        Some(pass.report.rows),
        predictor,
    )
}

/// State with the fallback target and no fleet report.
pub fn fallback_state() -> AppState {
    let config = EngineConfig::default();
    let resolution = TargetPolicy::from_config(&config)
        .fallback_target()
        .unwrap_or_else(|e| panic!("default fallback target invalid: {e}"));
    AppState::from_parts(config, resolution, None, Arc::new(FixedPredictor(1600.0)))
}

/// State with an explicit target value and the given predictor.
pub fn state_with_target(target: f64, predictor: SharedPredictor) -> AppState {
    let config = EngineConfig::default();
    let target = RegulatoryTarget::fixed(target, config.formula)
        .unwrap_or_else(|e| panic!("invalid test target {target}: {e}"));
    AppState::from_parts(
        config,
        TargetResolution {
            target,
            source: TargetSource::Explicit,
        },
        None,
        predictor,
    )
}

pub fn test_request_id() -> String {
    format!("test-{}", uuid::Uuid::now_v7())
}
