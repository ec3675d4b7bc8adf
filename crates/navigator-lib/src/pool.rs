//! Compliance pooling: offsetting deficit vessels with surplus vessels.
//!
//! A pool's net balance is the sum of its members' compliance balances. The
//! pool is compliant when that sum is not negative.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::compliance::ComplianceStatus;
use crate::error::{Error, Result};
use crate::output::round2;
use crate::report::FleetReportRow;

/// One vessel taking part in a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolMember {
    pub ship_id: String,
    pub ship_type: String,
    pub compliance_status: ComplianceStatus,
    pub compliance_balance: f64,
}

/// Combined position of a pool. Values are unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolResult {
    pub members: Vec<PoolMember>,
    pub net_balance: f64,
    pub compliant: bool,
}

impl PoolResult {
    /// Copy with every balance rounded for display.
    pub fn rounded(&self) -> Self {
        Self {
            members: self
                .members
                .iter()
                .map(|m| PoolMember {
                    compliance_balance: round2(m.compliance_balance),
                    ..m.clone()
                })
                .collect(),
            net_balance: round2(self.net_balance),
            compliant: self.compliant,
        }
    }

    pub fn surplus_members(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.compliance_status == ComplianceStatus::Surplus)
            .count()
    }
}

/// Pool the named vessels of a fleet report.
///
/// At least two distinct vessels are required. Every vessel must be present
/// in `rows` and have a defined balance.
pub fn pool<S: AsRef<str>>(rows: &[FleetReportRow], ship_ids: &[S]) -> Result<PoolResult> {
    let mut seen = BTreeSet::new();
    let mut members = Vec::with_capacity(ship_ids.len());

    for ship_id in ship_ids {
        let ship_id = ship_id.as_ref().trim();
        if ship_id.is_empty() {
            return Err(Error::invalid("ship_ids", "ship ids must not be empty"));
        }
        if !seen.insert(ship_id) {
            return Err(Error::invalid(
                "ship_ids",
                format!("vessel {ship_id} is listed more than once"),
            ));
        }

        let row = rows
            .iter()
            .find(|row| row.ship_id == ship_id)
            .ok_or_else(|| {
                Error::invalid(
                    "ship_ids",
                    format!("vessel {ship_id} is not in the fleet report"),
                )
            })?;
        let (Some(compliance_status), Some(compliance_balance)) =
            (row.compliance_status, row.compliance_balance)
        else {
            return Err(Error::invalid(
                "ship_ids",
                format!("vessel {ship_id} has no defined intensity and cannot be pooled"),
            ));
        };

        members.push(PoolMember {
            ship_id: row.ship_id.clone(),
            ship_type: row.ship_type.clone(),
            compliance_status,
            compliance_balance,
        });
    }

    if members.len() < 2 {
        return Err(Error::invalid(
            "ship_ids",
            format!("a pool needs at least two vessels, got {}", members.len()),
        ));
    }

    let net_balance: f64 = members.iter().map(|m| m.compliance_balance).sum();
    let compliant = net_balance >= 0.0;

    tracing::debug!(
        members = members.len(),
        net_balance,
        compliant,
        "compliance pool evaluated"
    );

    Ok(PoolResult {
        members,
        net_balance,
        compliant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ship_id: &str, balance: Option<f64>) -> FleetReportRow {
        FleetReportRow {
            ship_id: ship_id.to_string(),
            ship_type: "Tanker".to_string(),
            distance: 100.0,
            fuel_consumption: 10.0,
            co2_emissions: 30.0,
            energy_mj: 402.0,
            ghg_intensity: balance.map(|b| 80.0 - b),
            compliance_status: balance.map(|b| {
                if b > 0.0 {
                    ComplianceStatus::Surplus
                } else {
                    ComplianceStatus::Deficit
                }
            }),
            compliance_balance: balance,
        }
    }

    fn fleet() -> Vec<FleetReportRow> {
        vec![
            row("D1", Some(-3.5)),
            row("S1", Some(5.0)),
            row("S2", Some(1.0)),
            row("U1", None),
        ]
    }

    #[test]
    fn surplus_offsets_deficit() {
        let result = pool(&fleet(), &["D1", "S1"]).unwrap();
        assert_eq!(result.net_balance, 1.5);
        assert!(result.compliant);
        assert_eq!(result.members[0].ship_id, "D1");
        assert_eq!(result.surplus_members(), 1);
    }

    #[test]
    fn rounding_keeps_the_compliance_decision() {
        let rows = vec![row("D1", Some(-2.004)), row("S1", Some(2.0))];
        let result = pool(&rows, &["D1", "S1"]).unwrap();
        assert!(!result.compliant);

        let rounded = result.rounded();
        assert_eq!(rounded.net_balance, 0.0);
        assert_eq!(rounded.members[0].compliance_balance, -2.0);
        assert!(!rounded.compliant);
    }

    #[test]
    fn insufficient_surplus_is_non_compliant() {
        let result = pool(&fleet(), &["D1", "S2"]).unwrap();
        assert_eq!(result.net_balance, -2.5);
        assert!(!result.compliant);
    }

    #[test]
    fn zero_net_balance_is_compliant() {
        let rows = vec![row("D1", Some(-2.0)), row("S1", Some(2.0))];
        assert!(pool(&rows, &["D1", "S1"]).unwrap().compliant);
    }

    #[test]
    fn rejects_unknown_undefined_and_duplicate_vessels() {
        let unknown = pool(&fleet(), &["D1", "X9"]).unwrap_err();
        assert!(unknown.to_string().contains("X9"));

        let undefined = pool(&fleet(), &["D1", "U1"]).unwrap_err();
        assert!(undefined.to_string().contains("no defined intensity"));

        let duplicate = pool(&fleet(), &["S1", "S1"]).unwrap_err();
        assert!(duplicate.to_string().contains("more than once"));
        assert_eq!(duplicate.kind(), "input_error");
    }

    #[test]
    fn needs_two_vessels() {
        assert!(pool(&fleet(), &["S1"]).is_err());
        assert!(pool::<&str>(&fleet(), &[]).is_err());
    }
}
