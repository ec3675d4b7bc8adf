//! Classification of an intensity against a regulatory target.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether a vessel or voyage beats the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceStatus {
    /// Strictly below the target.
    Surplus,
    /// At or above the target.
    Deficit,
}

impl ComplianceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ComplianceStatus::Surplus => "Surplus",
            ComplianceStatus::Deficit => "Deficit",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one compliance evaluation. Values are unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub ghg_intensity: f64,
    pub compliance_status: ComplianceStatus,
    /// `target - intensity`; positive means surplus.
    pub compliance_balance: f64,
    pub target_used: f64,
}

/// Compare an intensity against a target.
///
/// `intensity == target` is a [`ComplianceStatus::Deficit`]: only a strictly
/// lower intensity earns a surplus.
pub fn classify(intensity: f64, target: f64) -> Result<ComplianceResult> {
    if !intensity.is_finite() {
        return Err(Error::invalid(
            "ghg_intensity",
            format!("must be finite, got {intensity}"),
        ));
    }
    if !target.is_finite() {
        return Err(Error::invalid(
            "target",
            format!("must be finite, got {target}"),
        ));
    }

    let compliance_status = if intensity < target {
        ComplianceStatus::Surplus
    } else {
        ComplianceStatus::Deficit
    };

    Ok(ComplianceResult {
        ghg_intensity: intensity,
        compliance_status,
        compliance_balance: target - intensity,
        target_used: target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_intensity_is_a_deficit() {
        let result = classify(100.0, 100.0).unwrap();
        assert_eq!(result.compliance_status, ComplianceStatus::Deficit);
        assert_eq!(result.compliance_balance, 0.0);
    }

    #[test]
    fn just_below_target_is_a_surplus() {
        let result = classify(99.999, 100.0).unwrap();
        assert_eq!(result.compliance_status, ComplianceStatus::Surplus);
        assert!(result.compliance_balance > 0.0);
    }

    #[test]
    fn above_target_has_negative_balance() {
        let result = classify(110.0, 100.0).unwrap();
        assert_eq!(result.compliance_status, ComplianceStatus::Deficit);
        assert_eq!(result.compliance_balance, -10.0);
        assert_eq!(result.target_used, 100.0);
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        assert!(classify(f64::NAN, 100.0).is_err());
        assert!(classify(f64::INFINITY, 100.0).is_err());
        assert!(classify(50.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn status_serializes_as_label() {
        let json = serde_json::to_string(&ComplianceStatus::Surplus).unwrap();
        assert_eq!(json, "\"Surplus\"");
        assert_eq!(ComplianceStatus::Deficit.to_string(), "Deficit");
    }
}
