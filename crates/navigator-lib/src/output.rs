//! Presentation helpers.
//!
//! The engine keeps full precision internally; values are rounded to two
//! decimals only when rendered for a caller.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::compliance::ComplianceStatus;
use crate::predictor::VoyageDecision;

/// Round to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Serving response for one evaluated voyage, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionView {
    pub predicted_co2: f64,
    pub ghg_intensity: f64,
    pub compliance_status: ComplianceStatus,
    pub compliance_balance: f64,
    pub target_used: f64,
}

impl From<&VoyageDecision> for PredictionView {
    fn from(decision: &VoyageDecision) -> Self {
        Self {
            predicted_co2: round2(decision.predicted_co2_kg),
            ghg_intensity: round2(decision.compliance.ghg_intensity),
            compliance_status: decision.compliance.compliance_status,
            compliance_balance: round2(decision.compliance.compliance_balance),
            target_used: round2(decision.compliance.target_used),
        }
    }
}

impl PredictionView {
    /// Multi-line plain text rendering.
    pub fn render_text(&self, unit: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Predicted CO2:      {:.2} kg", self.predicted_co2);
        let _ = writeln!(out, "GHG intensity:      {:.2} {unit}", self.ghg_intensity);
        let _ = writeln!(out, "Target used:        {:.2} {unit}", self.target_used);
        let _ = writeln!(out, "Compliance balance: {:+.2}", self.compliance_balance);
        let _ = write!(out, "Compliance status:  {}", self.compliance_status);
        out
    }
}
