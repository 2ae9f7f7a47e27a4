//! Tests for threshold classification and indicator-column presence.

use std::collections::BTreeMap;

use polars::prelude::*;

use nutri_adequakit::adequacy::{classify, indicator_keys, IndicatorKey, SupplyScope};
use nutri_adequakit::supply::{HouseholdSupply, SupplyKey};
use nutri_adequakit::thresholds::{NutrientThresholds, ThresholdKind};

fn thresholds(rows: &[(&str, Option<f64>, Option<f64>)]) -> NutrientThresholds {
    let nutrients: Vec<&str> = rows.iter().map(|r| r.0).collect();
    let ears: Vec<Option<f64>> = rows.iter().map(|r| r.1).collect();
    let uls: Vec<Option<f64>> = rows.iter().map(|r| r.2).collect();
    let df = DataFrame::new(vec![
        Series::new("nutrient".into(), nutrients).into(),
        Series::new("ear".into(), ears).into(),
        Series::new("ul".into(), uls).into(),
    ])
    .unwrap();
    NutrientThresholds::from_frame(&df).unwrap()
}

fn household(base: f64, total_2021: f64) -> HouseholdSupply {
    let mut supply = BTreeMap::new();
    supply.insert(SupplyKey::base("A"), base);
    supply.insert(SupplyKey::lsff("A", 2021), total_2021 - base);
    supply.insert(SupplyKey::total("A", 2021), total_2021);
    HouseholdSupply {
        household_id: "H1".to_string(),
        group_key: vec!["X".to_string()],
        amount_afe_total: 0.0,
        vehicle_amount_afe_total: 0.0,
        consumes_vehicle: false,
        supply,
    }
}

fn indicator(nutrient: &str, scope: SupplyScope, kind: ThresholdKind) -> IndicatorKey {
    IndicatorKey {
        nutrient: nutrient.to_string(),
        scope,
        kind,
    }
}

#[test]
fn supply_equal_to_ear_is_adequate() {
    let thresholds = thresholds(&[("A", Some(20.0), None)]);
    let nutrients = vec!["A".to_string()];
    let keys = indicator_keys(&thresholds, &nutrients, &[2021]);

    let adequacies = classify(&[household(20.0, 20.0)], &thresholds, &keys);
    let flags = &adequacies[0].indicators;

    assert_eq!(
        flags[&indicator("A", SupplyScope::Base, ThresholdKind::Ear)],
        0
    );
    assert_eq!(
        flags[&indicator("A", SupplyScope::BaseAndLsff(2021), ThresholdKind::Ear)],
        0
    );
}

#[test]
fn supply_below_ear_is_inadequate() {
    let thresholds = thresholds(&[("A", Some(20.0), None)]);
    let nutrients = vec!["A".to_string()];
    let keys = indicator_keys(&thresholds, &nutrients, &[2021]);

    let adequacies = classify(&[household(19.99, 21.0)], &thresholds, &keys);
    let flags = &adequacies[0].indicators;

    assert_eq!(
        flags[&indicator("A", SupplyScope::Base, ThresholdKind::Ear)],
        1
    );
    // The fortified total crossed the EAR.
    assert_eq!(
        flags[&indicator("A", SupplyScope::BaseAndLsff(2021), ThresholdKind::Ear)],
        0
    );
}

#[test]
fn supply_equal_to_ul_is_not_exceedance() {
    let thresholds = thresholds(&[("A", None, Some(100.0))]);
    let nutrients = vec!["A".to_string()];
    let keys = indicator_keys(&thresholds, &nutrients, &[2021]);

    let adequacies = classify(&[household(100.0, 100.01)], &thresholds, &keys);
    let flags = &adequacies[0].indicators;

    assert_eq!(
        flags[&indicator("A", SupplyScope::Base, ThresholdKind::Ul)],
        0
    );
    assert_eq!(
        flags[&indicator("A", SupplyScope::BaseAndLsff(2021), ThresholdKind::Ul)],
        1
    );
}

#[test]
fn nutrient_without_thresholds_produces_no_keys() {
    let thresholds = thresholds(&[("A", Some(20.0), Some(100.0)), ("B", None, None)]);
    let nutrients = vec!["A".to_string(), "B".to_string()];
    let keys = indicator_keys(&thresholds, &nutrients, &[2021, 2022]);

    assert!(keys.iter().all(|k| k.nutrient == "A"));
    // A with both thresholds: (base + 2 years) x 2 kinds.
    assert_eq!(keys.len(), 6);
}

#[test]
fn nutrient_with_only_ul_produces_only_exceedance_keys() {
    let thresholds = thresholds(&[("A", None, Some(100.0))]);
    let nutrients = vec!["A".to_string()];
    let keys = indicator_keys(&thresholds, &nutrients, &[2021]);

    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|k| k.kind == ThresholdKind::Ul));
}

#[test]
fn unknown_nutrient_produces_no_keys() {
    let thresholds = thresholds(&[("A", Some(20.0), None)]);
    let nutrients = vec!["Zn".to_string()];
    let keys = indicator_keys(&thresholds, &nutrients, &[2021]);

    assert!(keys.is_empty());
}

#[test]
fn indicator_column_names() {
    assert_eq!(
        indicator("A", SupplyScope::Base, ThresholdKind::Ear).column_name(),
        "A_base_supply_ear_inadequacy"
    );
    assert_eq!(
        indicator("A", SupplyScope::BaseAndLsff(2023), ThresholdKind::Ear).column_name(),
        "A_2023_base_and_lsff_ear_inadequacy"
    );
    assert_eq!(
        indicator("A", SupplyScope::Base, ThresholdKind::Ul).column_name(),
        "A_base_ul_exceedance"
    );
    assert_eq!(
        indicator("A", SupplyScope::BaseAndLsff(2023), ThresholdKind::Ul).column_name(),
        "A_2023_base_and_lsff_ul_exceedance"
    );
}
