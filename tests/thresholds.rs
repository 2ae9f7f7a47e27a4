//! Tests for EAR/UL threshold lookup.

use polars::prelude::*;

use nutri_adequakit::{threshold, AdequacyError, ThresholdKind};

fn table() -> DataFrame {
    DataFrame::new(vec![
        Series::new("nutrient".into(), vec!["A", "Fe", "Zn"]).into(),
        Series::new("ear".into(), vec![Some(20.0), None, Some(8.0)]).into(),
        Series::new("ul".into(), vec![Some(100.0), Some(45.0), None]).into(),
    ])
    .unwrap()
}

#[test]
fn resolves_defined_values() {
    assert_eq!(
        threshold(&table(), "A", ThresholdKind::Ear).unwrap(),
        Some(20.0)
    );
    assert_eq!(
        threshold(&table(), "Fe", ThresholdKind::Ul).unwrap(),
        Some(45.0)
    );
}

#[test]
fn missing_value_is_none_not_an_error() {
    assert_eq!(threshold(&table(), "Fe", ThresholdKind::Ear).unwrap(), None);
    assert_eq!(threshold(&table(), "Zn", ThresholdKind::Ul).unwrap(), None);
}

#[test]
fn unknown_nutrient_is_none_not_an_error() {
    assert_eq!(
        threshold(&table(), "Folate", ThresholdKind::Ear).unwrap(),
        None
    );
    assert_eq!(
        threshold(&table(), "Folate", ThresholdKind::Ul).unwrap(),
        None
    );
}

#[test]
fn legacy_cnd_column_is_accepted_for_ear() {
    let table = DataFrame::new(vec![
        Series::new("nutrient".into(), vec!["A"]).into(),
        Series::new("CND".into(), vec![Some(20.0)]).into(),
        Series::new("ul".into(), vec![None::<f64>]).into(),
    ])
    .unwrap();

    assert_eq!(
        threshold(&table, "A", ThresholdKind::Ear).unwrap(),
        Some(20.0)
    );
}

#[test]
fn table_without_ear_or_cnd_column_is_a_schema_error() {
    let table = DataFrame::new(vec![
        Series::new("nutrient".into(), vec!["A"]).into(),
        Series::new("ul".into(), vec![Some(100.0)]).into(),
    ])
    .unwrap();

    let err = threshold(&table, "A", ThresholdKind::Ear).unwrap_err();
    match err {
        AdequacyError::MissingColumns { table, columns } => {
            assert_eq!(table, "intakeThresholds");
            assert_eq!(columns, vec!["ear".to_string()]);
        }
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}

#[test]
fn string_typed_threshold_values_parse() {
    // Caller tables loaded with all-string columns still resolve.
    let table = DataFrame::new(vec![
        Series::new("nutrient".into(), vec!["A"]).into(),
        Series::new("ear".into(), vec!["20"]).into(),
        Series::new("ul".into(), vec![""]).into(),
    ])
    .unwrap();

    assert_eq!(
        threshold(&table, "A", ThresholdKind::Ear).unwrap(),
        Some(20.0)
    );
    assert_eq!(threshold(&table, "A", ThresholdKind::Ul).unwrap(), None);
}
