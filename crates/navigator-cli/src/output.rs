//! Output formatting for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

use navigator_lib::{
    CompliancePass, ExcludedVessel, FleetReportRow, FleetSummary, IntensityFormula, PoolResult,
    PredictionView, RegulatoryTarget, RejectedVoyage, ShipTypeConflict, TargetSource,
};

/// How command results are printed on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Text,
    /// Pretty-printed JSON document.
    Json,
}

/// JSON document printed by `report --format json`.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub target: &'a RegulatoryTarget,
    pub summary: &'a FleetSummary,
    pub rows: &'a [FleetReportRow],
    pub rejected: &'a [RejectedVoyage],
    pub conflicts: &'a [ShipTypeConflict],
    pub excluded: &'a [ExcludedVessel],
}

impl<'a> ReportDocument<'a> {
    pub fn new(pass: &'a CompliancePass, rejected: &'a [RejectedVoyage]) -> Self {
        Self {
            target: &pass.target,
            summary: &pass.report.summary,
            rows: &pass.report.rows,
            rejected,
            conflicts: &pass.aggregation.conflicts,
            excluded: &pass.aggregation.excluded,
        }
    }
}

/// Render a compliance pass in the requested format.
pub fn render_report(
    pass: &CompliancePass,
    rejected: &[RejectedVoyage],
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&ReportDocument::new(pass, rejected)),
        OutputFormat::Text => {
            let mut out = pass.report.render_table(pass.target.formula.unit());
            for row in rejected {
                out.push_str(&format!(
                    "Skipped row {} ({}): {}\n",
                    row.row,
                    row.ship_id.as_deref().unwrap_or("unknown ship"),
                    row.reason
                ));
            }
            for conflict in &pass.aggregation.conflicts {
                out.push_str(&format!(
                    "Ship {} recorded as both '{}' and '{}'; kept '{}'\n",
                    conflict.ship_id, conflict.kept, conflict.conflicting, conflict.kept
                ));
            }
            for vessel in &pass.aggregation.excluded {
                out.push_str(&format!("Excluded {}: {}\n", vessel.ship_id, vessel.reason));
            }
            Ok(out)
        }
    }
}

/// JSON document printed by `evaluate --format json`.
#[derive(Debug, Serialize)]
pub struct EvaluationDocument<'a> {
    #[serde(flatten)]
    pub view: &'a PredictionView,
    pub target_source: TargetSource,
}

/// Render a single-voyage evaluation in the requested format.
pub fn render_evaluation(
    view: &PredictionView,
    formula: IntensityFormula,
    source: TargetSource,
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&EvaluationDocument {
            view,
            target_source: source,
        }),
        OutputFormat::Text => {
            let origin = match source {
                TargetSource::Loaded => "loaded",
                TargetSource::Fallback => "fallback",
                TargetSource::Explicit => "explicit",
            };
            Ok(format!(
                "{}\nTarget source:      {origin}",
                view.render_text(formula.unit())
            ))
        }
    }
}

/// Render a pooling result, balances rounded for display.
pub fn render_pool(result: &PoolResult, format: OutputFormat) -> serde_json::Result<String> {
    let rounded = result.rounded();
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&rounded),
        OutputFormat::Text => {
            let mut out = String::new();
            for member in &rounded.members {
                out.push_str(&format!(
                    "{:<12} {:<20} {:>10} {:>+10.2}\n",
                    member.ship_id,
                    member.ship_type,
                    member.compliance_status,
                    member.compliance_balance
                ));
            }
            out.push_str(&format!("Net balance: {:+.2}\n", rounded.net_balance));
            out.push_str(if rounded.compliant {
                "Pool compliant: no additional credits required"
            } else {
                "Pool non-compliant: additional credits required"
            });
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navigator_lib::{pool, run_compliance_pass, ComplianceStatus, EngineConfig, Voyage};

    fn pass() -> CompliancePass {
        let voyages = vec![
            Voyage::new("A", "Tanker", 100.0, 100.0, "HFO", 300.0).unwrap(),
            Voyage::new("B", "Ferry", 100.0, 100.0, "HFO", 340.0).unwrap(),
        ];
        run_compliance_pass(&voyages, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn json_report_carries_rows_and_target() {
        let rejected = vec![RejectedVoyage {
            row: 4,
            ship_id: Some("C".to_string()),
            reason: "bad distance".to_string(),
        }];
        let json = render_report(&pass(), &rejected, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rows"].as_array().unwrap().len(), 2);
        assert_eq!(value["rejected"][0]["row"], 4);
        assert_eq!(value["target"]["formula"], "energy-normalized");
    }

    #[test]
    fn text_report_lists_skipped_rows() {
        let rejected = vec![RejectedVoyage {
            row: 4,
            ship_id: None,
            reason: "bad distance".to_string(),
        }];
        let text = render_report(&pass(), &rejected, OutputFormat::Text).unwrap();
        assert!(text.contains("gCO2/MJ"));
        assert!(text.contains("Skipped row 4 (unknown ship): bad distance"));
    }

    #[test]
    fn evaluation_json_is_flat() {
        let view = PredictionView {
            predicted_co2: 1600.0,
            ghg_intensity: 79.6,
            compliance_status: ComplianceStatus::Surplus,
            compliance_balance: 10.4,
            target_used: 90.0,
        };
        let json = render_evaluation(
            &view,
            IntensityFormula::EnergyNormalized,
            TargetSource::Fallback,
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["compliance_status"], "Surplus");
        assert_eq!(value["target_source"], "fallback");
    }

    #[test]
    fn pool_text_reports_the_net_position() {
        let pass = pass();
        let result = pool(&pass.report.rows, &["A", "B"]).unwrap();
        let text = render_pool(&result, OutputFormat::Text).unwrap();
        assert!(text.contains("Net balance: -7.96"));
        assert!(text.contains("Pool non-compliant"));
        assert!(text.contains("Surplus"));
        assert!(text.contains("Deficit"));
    }

    #[test]
    fn pool_json_is_rounded() {
        let pass = pass();
        let result = pool(&pass.report.rows, &["A", "B"]).unwrap();
        let json = render_pool(&result, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["members"].as_array().unwrap().len(), 2);
        assert_eq!(value["compliant"], result.compliant);
    }
}
