mod common;

use navigator_lib::{
    pool, run_compliance_pass, ArtifactStore, ComplianceStatus, EngineConfig, IntensityFormula,
    ShipTypePolicy, TargetPolicy, TargetSource, HFO_LCV_MJ_PER_KG,
};
use tempfile::tempdir;

#[test]
fn fixture_log_skips_the_malformed_row() {
    let log = common::fixture_log();
    assert_eq!(log.voyages.len(), 6);
    assert_eq!(log.rejected.len(), 1);
    assert_eq!(log.rejected[0].ship_id.as_deref(), Some("S005"));
    assert!(log.source_path().is_some());
}

#[test]
fn vessels_are_aggregated_in_ship_id_order() {
    let pass = run_compliance_pass(&common::fixture_voyages(), &EngineConfig::default())
        .expect("pass succeeds");

    let ids: Vec<&str> = pass
        .report
        .rows
        .iter()
        .map(|row| row.ship_id.as_str())
        .collect();
    assert_eq!(ids, vec!["S001", "S002", "S003", "S004"]);

    let tanker = &pass.aggregation.vessels[0];
    assert_eq!(tanker.voyages, 2);
    assert_eq!(tanker.fuel_consumption, 900.0);
    assert_eq!(tanker.co2_emissions, 2900.0);
    assert_eq!(tanker.energy_mj, 900.0 * HFO_LCV_MJ_PER_KG);
    let expected = 2900.0 * 1000.0 / (900.0 * HFO_LCV_MJ_PER_KG);
    assert!((tanker.ghg_intensity.unwrap() - expected).abs() < 1e-9);
}

#[test]
fn target_is_margin_below_the_mean_of_defined_intensities() {
    let pass = run_compliance_pass(&common::fixture_voyages(), &EngineConfig::default())
        .expect("pass succeeds");

    let defined: Vec<f64> = pass.aggregation.scored().filter_map(|v| v.ghg_intensity).collect();
    assert_eq!(defined.len(), 3);
    let mean = defined.iter().sum::<f64>() / defined.len() as f64;

    assert_eq!(pass.target.vessel_count, 3);
    assert!((pass.target.fleet_average - mean).abs() < 1e-9);
    assert!((pass.target.target - mean * 0.95).abs() < 1e-9);
    assert_eq!(pass.report.summary.undefined, 1);
    assert_eq!(
        pass.report.summary.surplus + pass.report.summary.deficit,
        3
    );
}

#[test]
fn classification_follows_the_strict_comparison() {
    let pass = run_compliance_pass(&common::fixture_voyages(), &EngineConfig::default())
        .expect("pass succeeds");

    for row in &pass.report.rows {
        match (row.ghg_intensity, row.compliance_status) {
            (Some(intensity), Some(status)) => {
                let expected = if intensity < pass.target.target {
                    ComplianceStatus::Surplus
                } else {
                    ComplianceStatus::Deficit
                };
                assert_eq!(status, expected, "vessel {}", row.ship_id);
                let balance = row.compliance_balance.unwrap();
                assert!((balance - (pass.target.target - intensity)).abs() < 1e-9);
            }
            (None, None) => assert_eq!(row.ship_id, "S004"),
            other => panic!("inconsistent row {}: {other:?}", row.ship_id),
        }
    }
}

#[test]
fn distance_formula_produces_its_own_target() {
    let config = EngineConfig {
        formula: IntensityFormula::DistanceNormalized,
        ..EngineConfig::default()
    };
    let pass = run_compliance_pass(&common::fixture_voyages(), &config).expect("pass succeeds");
    assert_eq!(pass.target.formula, IntensityFormula::DistanceNormalized);

    let tanker = &pass.aggregation.vessels[0];
    assert!((tanker.ghg_intensity.unwrap() - 2900.0 / 1800.0).abs() < 1e-9);
}

#[test]
fn strict_policy_accepts_a_consistent_fleet() {
    let config = EngineConfig {
        ship_type_policy: ShipTypePolicy::Strict,
        ..EngineConfig::default()
    };
    let pass = run_compliance_pass(&common::fixture_voyages(), &config).expect("pass succeeds");
    assert!(pass.aggregation.conflicts.is_empty());
    assert!(pass.aggregation.excluded.is_empty());
}

#[test]
fn persisted_artifacts_feed_the_serving_target() {
    let dir = tempdir().expect("temp dir");
    let store = ArtifactStore::new(dir.path());
    let config = EngineConfig::default();

    let pass = run_compliance_pass(&common::fixture_voyages(), &config).expect("pass succeeds");
    store.save(&pass).expect("save artifacts");

    let resolution = TargetPolicy::from_config(&config)
        .resolve(&store)
        .expect("resolve target");
    assert_eq!(resolution.source, TargetSource::Loaded);
    assert_eq!(
        resolution.target.target.to_bits(),
        pass.target.target.to_bits()
    );

    let rows = store.load_report().expect("load report");
    assert_eq!(rows, pass.report.rows);

    let csv = std::fs::read_to_string(store.report_path()).expect("read report");
    assert!(csv.lines().any(|line| line.starts_with("S004,Tug,") && line.ends_with(",,,")));
}

#[test]
fn rerunning_the_pass_is_idempotent() {
    let voyages = common::fixture_voyages();
    let config = EngineConfig::default();
    let first = run_compliance_pass(&voyages, &config).expect("first pass");
    let second = run_compliance_pass(&voyages, &config).expect("second pass");
    assert_eq!(first.target.target.to_bits(), second.target.target.to_bits());
    assert_eq!(first.report, second.report);
}

#[test]
fn summary_splits_the_fleet_by_ship_type() {
    let pass = run_compliance_pass(&common::fixture_voyages(), &EngineConfig::default())
        .expect("pass succeeds");
    let summary = &pass.report.summary;

    let types: Vec<&str> = summary
        .by_ship_type
        .iter()
        .map(|b| b.ship_type.as_str())
        .collect();
    assert_eq!(types, ["Bulk Carrier", "Ferry", "Tanker", "Tug"]);
    assert_eq!(summary.by_ship_type[1].surplus, 1);
    assert_eq!(summary.by_ship_type[3].undefined, 1);
    assert!((summary.compliance_rate - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn pooling_a_deficit_with_the_surplus_ferry() {
    let pass = run_compliance_pass(&common::fixture_voyages(), &EngineConfig::default())
        .expect("pass succeeds");
    let rows = &pass.report.rows;

    let result = pool(rows, &["S001", "S002"]).expect("pool evaluated");
    let expected = rows[0].compliance_balance.unwrap() + rows[1].compliance_balance.unwrap();
    assert_eq!(result.net_balance, expected);
    assert!(result.net_balance < 0.0);
    assert!(!result.compliant);
    assert_eq!(result.surplus_members(), 1);

    assert!(pool(rows, &["S001", "S004"]).is_err());
}
