//! Tests for the grouped aggregation engine.

use std::collections::BTreeMap;

use nutri_adequakit::adequacy::{HouseholdAdequacy, IndicatorKey, SupplyScope};
use nutri_adequakit::aggregation::aggregate;
use nutri_adequakit::supply::{HouseholdSupply, SupplyKey};
use nutri_adequakit::thresholds::ThresholdKind;
use nutri_adequakit::AdequacyError;

fn supply(
    household_id: &str,
    group: &[&str],
    base_a: f64,
    amount_afe: f64,
    vehicle_amount_afe: f64,
) -> HouseholdSupply {
    let mut map = BTreeMap::new();
    map.insert(SupplyKey::base("A"), base_a);
    HouseholdSupply {
        household_id: household_id.to_string(),
        group_key: group.iter().map(|s| s.to_string()).collect(),
        amount_afe_total: amount_afe,
        vehicle_amount_afe_total: vehicle_amount_afe,
        consumes_vehicle: vehicle_amount_afe > 0.0,
        supply: map,
    }
}

fn adequacy(household_id: &str, group: &[&str], flagged: bool) -> HouseholdAdequacy {
    let mut indicators = BTreeMap::new();
    indicators.insert(
        IndicatorKey {
            nutrient: "A".to_string(),
            scope: SupplyScope::Base,
            kind: ThresholdKind::Ear,
        },
        u8::from(flagged),
    );
    HouseholdAdequacy {
        household_id: household_id.to_string(),
        group_key: group.iter().map(|s| s.to_string()).collect(),
        indicators,
    }
}

#[test]
fn counts_and_percentages_per_group() {
    let supplies = vec![
        supply("H1", &["X"], 25.0, 50.0, 50.0),
        supply("H2", &["X"], 10.0, 200.0, 0.0),
        supply("H3", &["X"], 40.0, 90.0, 30.0),
    ];
    let adequacies = vec![
        adequacy("H1", &["X"], false),
        adequacy("H2", &["X"], true),
        adequacy("H3", &["X"], false),
    ];

    let groups = aggregate(&supplies, &adequacies).unwrap();
    assert_eq!(groups.len(), 1);

    let summary = &groups[&vec!["X".to_string()]];
    assert_eq!(summary.households_count, 3);
    assert_eq!(summary.vehicle_reach_hh_count, 2);
    assert_eq!(summary.vehicle_reach_hh_perc, 66.67);

    let ear_key = IndicatorKey {
        nutrient: "A".to_string(),
        scope: SupplyScope::Base,
        kind: ThresholdKind::Ear,
    };
    assert_eq!(summary.indicators[&ear_key].count, 1);
    assert_eq!(summary.indicators[&ear_key].perc, 33.33);

    // Means/medians run over per-household totals, not items.
    assert_eq!(summary.mean_amount_afe, (50.0 + 200.0 + 90.0) / 3.0);
    assert_eq!(summary.median_amount_afe, 90.0);
    assert_eq!(summary.median_vehicle_amount_afe, 30.0);

    // Base supplies 25, 10, 40: mean 25, median 25, rounded to 0 decimals.
    let stats = &summary.supply_stats["A"];
    assert_eq!(stats.mean, 25.0);
    assert_eq!(stats.median, 25.0);
}

#[test]
fn groups_are_kept_separate() {
    let supplies = vec![
        supply("H1", &["X"], 25.0, 50.0, 50.0),
        supply("H2", &["Y"], 10.0, 200.0, 0.0),
    ];
    let adequacies = vec![
        adequacy("H1", &["X"], false),
        adequacy("H2", &["Y"], true),
    ];

    let groups = aggregate(&supplies, &adequacies).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&vec!["X".to_string()]].households_count, 1);
    assert_eq!(groups[&vec!["Y".to_string()]].households_count, 1);
    assert_eq!(groups[&vec!["Y".to_string()]].vehicle_reach_hh_count, 0);
    assert_eq!(groups[&vec!["Y".to_string()]].vehicle_reach_hh_perc, 0.0);
}

#[test]
fn group_key_mismatch_is_an_error() {
    let supplies = vec![supply("H1", &["X"], 25.0, 50.0, 50.0)];
    // The indicator summary carries a group the counts never saw.
    let adequacies = vec![adequacy("H1", &["Y"], false)];

    let err = aggregate(&supplies, &adequacies).unwrap_err();
    match err {
        AdequacyError::InvalidData(message) => {
            assert!(message.contains("join-key mismatch") || message.contains("indicator"));
        }
        other => panic!("expected InvalidData, got {other:?}"),
    }
}
