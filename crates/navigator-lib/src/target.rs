//! Fleet-relative regulatory target derivation.
//!
//! The benchmark is not an externally fixed number: it is the fleet's own
//! mean intensity reduced by a margin (5% by default).

use std::borrow::Borrow;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::aggregate::VesselAggregate;
use crate::error::{Error, Result};
use crate::intensity::IntensityFormula;

/// Default reduction applied to the fleet average.
pub const DEFAULT_MARGIN: f64 = 0.05;

/// Target used when no derived target is available (gCO2/MJ).
pub const DEFAULT_FALLBACK_TARGET: f64 = 89.34;

/// Benchmark intensity for one fleet-evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryTarget {
    /// Benchmark intensity vessels are measured against.
    pub target: f64,
    /// Mean intensity of the vessels the target was derived from.
    pub fleet_average: f64,
    /// Number of vessels contributing to the mean.
    pub vessel_count: usize,
    /// Reduction applied to the fleet average.
    pub margin: f64,
    pub formula: IntensityFormula,
}

impl RegulatoryTarget {
    /// A fixed target that was not derived from any fleet (e.g. a fallback constant).
    pub fn fixed(target: f64, formula: IntensityFormula) -> Result<Self> {
        if !target.is_finite() || target <= 0.0 {
            return Err(Error::invalid(
                "target",
                format!("must be finite and positive, got {target}"),
            ));
        }
        Ok(Self {
            target,
            fleet_average: target,
            vessel_count: 0,
            margin: 0.0,
            formula,
        })
    }
}

/// Check a margin lies in `[0, 1)`.
pub fn validate_margin(margin: f64) -> Result<f64> {
    if !margin.is_finite() || !(0.0..1.0).contains(&margin) {
        return Err(Error::invalid(
            "margin",
            format!("must be within [0, 1), got {margin}"),
        ));
    }
    Ok(margin)
}

/// Derive the regulatory target from aggregated vessels.
///
/// Vessels with an undefined intensity are excluded from the mean rather
/// than counted as zero. Fails with [`Error::EmptyFleet`] when no vessel has
/// a defined intensity.
pub fn derive_target(
    aggregates: &[VesselAggregate],
    margin: f64,
    formula: IntensityFormula,
) -> Result<RegulatoryTarget> {
    let margin = validate_margin(margin)?;

    let intensities: Vec<f64> = aggregates.iter().filter_map(|v| v.ghg_intensity).collect();
    if intensities.is_empty() {
        return Err(Error::EmptyFleet);
    }

    let fleet_average = intensities.iter().sum::<f64>() / intensities.len() as f64;
    let target = fleet_average * (1.0 - margin);

    tracing::info!(
        vessels = intensities.len(),
        skipped = aggregates.len() - intensities.len(),
        fleet_average,
        target,
        margin,
        "regulatory target derived"
    );

    Ok(RegulatoryTarget {
        target,
        fleet_average,
        vessel_count: intensities.len(),
        margin,
        formula,
    })
}

/// The serving-side "current target", replaceable at retrain time.
///
/// `T` is the target itself or a larger serving snapshot that carries one, so
/// everything served alongside the target is swapped in the same step.
/// Readers take a snapshot with [`SharedTarget::current`] and keep using it
/// even if a new value is swapped in concurrently.
#[derive(Debug)]
pub struct SharedTarget<T = RegulatoryTarget> {
    inner: Arc<RwLock<Arc<T>>>,
}

impl<T> Clone for SharedTarget<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Borrow<RegulatoryTarget>> SharedTarget<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(value))),
        }
    }

    /// Snapshot of the value in force right now.
    pub fn current(&self) -> Arc<T> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swap in a new value, returning the one it replaced.
    pub fn replace(&self, value: T) -> Arc<T> {
        let next = Arc::new(value);
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous: &RegulatoryTarget = (**guard).borrow();
        let incoming: &RegulatoryTarget = (*next).borrow();
        tracing::info!(
            previous = previous.target,
            next = incoming.target,
            "regulatory target replaced"
        );
        std::mem::replace(&mut *guard, next)
    }
}
