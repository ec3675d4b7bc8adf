//! Application state shared by all handlers.
//!
//! Holds the serving snapshot (target, its source, and the persisted fleet
//! report, swapped as one unit at retrain time) and the injected CO2
//! predictor.

use std::borrow::Borrow;
use std::path::Path;
use std::sync::Arc;

use navigator_lib::{
    ArtifactStore, Co2Predictor, CompliancePredictor, EngineConfig, Error as LibError,
    FleetReportRow, RegulatoryTarget, SharedTarget, TargetPolicy, TargetResolution, TargetSource,
    VoyageDecision, VoyageFeatures,
};

/// Predictor handle shared across request tasks.
pub type SharedPredictor = Arc<dyn Co2Predictor + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("invalid engine configuration: {0}")]
    Config(#[source] LibError),
    #[error("failed to load compliance artifacts: {0}")]
    Artifacts(#[source] LibError),
}

/// Everything a request needs from one retraining pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ServingSnapshot {
    pub target: RegulatoryTarget,
    pub source: TargetSource,
    /// `None` when no fleet report is loaded.
    pub fleet: Option<Arc<Vec<FleetReportRow>>>,
}

impl ServingSnapshot {
    pub fn new(resolution: TargetResolution, fleet: Option<Vec<FleetReportRow>>) -> Self {
        Self {
            target: resolution.target,
            source: resolution.source,
            fleet: fleet.map(Arc::new),
        }
    }
}

impl Borrow<RegulatoryTarget> for ServingSnapshot {
    fn borrow(&self) -> &RegulatoryTarget {
        &self.target
    }
}

/// Cheaply cloneable handle; share via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: EngineConfig,
    snapshot: SharedTarget<ServingSnapshot>,
    engine: CompliancePredictor<SharedPredictor>,
    store: Option<ArtifactStore>,
}

impl AppState {
    /// Load the target and fleet report from `artifact_dir`.
    ///
    /// A missing or unreadable target falls back to the configured constant.
    /// A missing fleet report leaves `/api/fleet` unavailable but does not
    /// fail startup.
    pub fn load(
        artifact_dir: impl AsRef<Path>,
        config: EngineConfig,
        predictor: SharedPredictor,
    ) -> Result<Self, AppStateError> {
        config.validate().map_err(AppStateError::Config)?;
        let store = ArtifactStore::new(artifact_dir.as_ref());
        let resolution = TargetPolicy::from_config(&config)
            .resolve(&store)
            .map_err(AppStateError::Config)?;
        let fleet = load_fleet(&store);

        Ok(Self::build(config, resolution, fleet, predictor, Some(store)))
    }

    /// Build state from pre-loaded parts (tests, embedded use).
    pub fn from_parts(
        config: EngineConfig,
        resolution: TargetResolution,
        fleet: Option<Vec<FleetReportRow>>,
        predictor: SharedPredictor,
    ) -> Self {
        Self::build(config, resolution, fleet, predictor, None)
    }

    fn build(
        config: EngineConfig,
        resolution: TargetResolution,
        fleet: Option<Vec<FleetReportRow>>,
        predictor: SharedPredictor,
        store: Option<ArtifactStore>,
    ) -> Self {
        let engine = CompliancePredictor::new(predictor).with_formula(config.formula);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                snapshot: SharedTarget::new(ServingSnapshot::new(resolution, fleet)),
                engine,
                store,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Consistent view of target, source and fleet report.
    pub fn snapshot(&self) -> Arc<ServingSnapshot> {
        self.inner.snapshot.current()
    }

    /// The target in force.
    pub fn target(&self) -> RegulatoryTarget {
        self.snapshot().target
    }

    pub fn target_source(&self) -> TargetSource {
        self.snapshot().source
    }

    /// Fleet report rows, or `None` when no report is loaded.
    pub fn fleet(&self) -> Option<Arc<Vec<FleetReportRow>>> {
        self.snapshot().fleet.clone()
    }

    /// Whether artifacts can be re-read from disk.
    pub fn can_reload(&self) -> bool {
        self.inner.store.is_some()
    }

    /// Score one voyage against the current target snapshot.
    pub fn evaluate(&self, features: &VoyageFeatures) -> Result<VoyageDecision, LibError> {
        let snapshot = self.snapshot();
        self.inner.engine.evaluate(features, &snapshot.target)
    }

    /// Swap in a new target and report in a single step, e.g. after a retrain.
    pub fn install(&self, resolution: TargetResolution, fleet: Option<Vec<FleetReportRow>>) {
        self.inner
            .snapshot
            .replace(ServingSnapshot::new(resolution, fleet));
    }

    /// Re-read artifacts from the directory the state was loaded from.
    ///
    /// State built with [`AppState::from_parts`] has no directory and keeps
    /// its current snapshot.
    pub fn reload(&self) -> Result<Arc<ServingSnapshot>, AppStateError> {
        let Some(store) = &self.inner.store else {
            return Ok(self.snapshot());
        };
        let resolution = TargetPolicy::from_config(&self.inner.config)
            .resolve(store)
            .map_err(AppStateError::Artifacts)?;
        self.install(resolution, load_fleet(store));

        let snapshot = self.snapshot();
        tracing::info!(
            source = ?snapshot.source,
            target = snapshot.target.target,
            fleet_vessels = snapshot.fleet.as_ref().map(|rows| rows.len()),
            "compliance artifacts reloaded"
        );
        Ok(snapshot)
    }
}

fn load_fleet(store: &ArtifactStore) -> Option<Vec<FleetReportRow>> {
    match store.load_report() {
        Ok(rows) => {
            tracing::info!(vessels = rows.len(), "fleet report loaded");
            Some(rows)
        }
        Err(err) => {
            tracing::warn!(error = %err, "fleet report unavailable");
            None
        }
    }
}
