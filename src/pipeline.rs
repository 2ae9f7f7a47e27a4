//! Pipeline orchestration: input validation, stage sequencing, and output
//! serialization.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adequacy::{classify, indicator_keys, IndicatorKey};
use crate::aggregation::{aggregate, GroupKey, GroupSummary};
use crate::enrich::enrich_consumption;
use crate::error::AdequacyError;
use crate::fortification::{FortifiableItems, FortificationLevels};
use crate::schema;
use crate::supply::project_supplies;
use crate::thresholds::NutrientThresholds;

/// Run configuration, constructed explicitly by the caller.
///
/// The pipeline embeds no domain constants: the grouping hierarchy (for
/// example `admin0Name`/`admin1Name`), the vehicle name, the projection
/// years, and the nutrient list all come from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdequacyConfig {
    /// Administrative label columns of householdDetails, outermost first.
    pub aggregation_group: Vec<String>,
    /// The fortification vehicle selected for this run.
    pub food_vehicle_name: String,
    /// Projection years for fortified supply.
    pub years: Vec<i32>,
    /// Nutrient codes; each must be a content column of the NCT.
    pub nutrients: Vec<String>,
}

impl AdequacyConfig {
    pub fn validate(&self) -> Result<(), AdequacyError> {
        if self.aggregation_group.is_empty() {
            return Err(AdequacyError::InvalidArgument(
                "aggregationGroup must not be empty".to_string(),
            ));
        }
        if self.aggregation_group.iter().any(|s| s.trim().is_empty()) {
            return Err(AdequacyError::InvalidArgument(
                "aggregationGroup entries must be non-empty column names".to_string(),
            ));
        }
        if self.food_vehicle_name.trim().is_empty() {
            return Err(AdequacyError::InvalidArgument(
                "foodVehicleName must not be empty".to_string(),
            ));
        }
        if self.nutrients.iter().any(|s| s.trim().is_empty()) {
            return Err(AdequacyError::InvalidArgument(
                "nutrientList entries must be non-empty nutrient codes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compute the adequacy summary table.
///
/// Validates the configuration and every input table's required columns
/// before any computation, then sequences enrichment, supply projection,
/// adequacy classification, and grouped aggregation. The output holds one
/// row per administrative group (sorted by group key) with the grouping
/// columns and `householdsCount` first and every other column in
/// alphabetical order; the reordering is cosmetic and changes no value.
pub fn compute_adequacy_summary(
    consumption: &DataFrame,
    household_details: &DataFrame,
    nct: &DataFrame,
    intake_thresholds: &DataFrame,
    fortifiable_food_items: &DataFrame,
    fortification_levels: &dyn FortificationLevels,
    config: &AdequacyConfig,
) -> Result<DataFrame, AdequacyError> {
    config.validate()?;
    validate_inputs(
        consumption,
        household_details,
        nct,
        intake_thresholds,
        fortifiable_food_items,
        config,
    )?;

    let thresholds = NutrientThresholds::from_frame(intake_thresholds)?;
    let fortifiable =
        FortifiableItems::from_frame(fortifiable_food_items, &config.food_vehicle_name)?;

    let items = enrich_consumption(
        consumption,
        household_details,
        nct,
        &fortifiable,
        &config.aggregation_group,
        &config.nutrients,
    )?;
    debug!(items = items.len(), "enriched consumption records");

    let supplies = project_supplies(
        &items,
        fortification_levels,
        &config.food_vehicle_name,
        &config.years,
        &config.nutrients,
    );
    debug!(
        households = supplies.len(),
        "projected per-household nutrient supplies"
    );

    let keys = indicator_keys(&thresholds, &config.nutrients, &config.years);
    let adequacies = classify(&supplies, &thresholds, &keys);

    let groups = aggregate(&supplies, &adequacies)?;
    debug!(groups = groups.len(), "aggregated adequacy summary");

    summary_frame(&groups, &keys, config)
}

fn validate_inputs(
    consumption: &DataFrame,
    household_details: &DataFrame,
    nct: &DataFrame,
    intake_thresholds: &DataFrame,
    fortifiable_food_items: &DataFrame,
    config: &AdequacyConfig,
) -> Result<(), AdequacyError> {
    schema::require_columns(consumption, "consumption", &schema::consumption::REQUIRED)?;

    let mut details_required: Vec<&str> = schema::household::REQUIRED.to_vec();
    details_required.extend(config.aggregation_group.iter().map(String::as_str));
    schema::require_columns(household_details, "householdDetails", &details_required)?;

    let mut nct_required: Vec<&str> = schema::nct::REQUIRED.to_vec();
    nct_required.extend(config.nutrients.iter().map(String::as_str));
    schema::require_columns(nct, "nctTable", &nct_required)?;

    schema::require_columns(
        intake_thresholds,
        "intakeThresholds",
        &[schema::thresholds::NUTRIENT, schema::thresholds::UL],
    )?;
    if intake_thresholds.column(schema::thresholds::EAR).is_err()
        && intake_thresholds
            .column(schema::thresholds::EAR_LEGACY)
            .is_err()
    {
        return Err(AdequacyError::MissingColumns {
            table: "intakeThresholds".to_string(),
            columns: vec![schema::thresholds::EAR.to_string()],
        });
    }

    schema::require_columns(
        fortifiable_food_items,
        "fortifiableFoodItems",
        &schema::fortifiable::REQUIRED,
    )?;

    Ok(())
}

enum MetricValues {
    Counts(Vec<u32>),
    Values(Vec<f64>),
}

/// Materialize the grouped summaries as a DataFrame.
///
/// Metric columns get their names here and nowhere earlier; a `BTreeMap`
/// keyed by column name yields the alphabetical order directly.
fn summary_frame(
    groups: &BTreeMap<GroupKey, GroupSummary>,
    keys: &BTreeSet<IndicatorKey>,
    config: &AdequacyConfig,
) -> Result<DataFrame, AdequacyError> {
    let nutrient_set: BTreeSet<&String> = config.nutrients.iter().collect();

    let mut labels: Vec<Vec<String>> = vec![Vec::new(); config.aggregation_group.len()];
    let mut households: Vec<u32> = Vec::new();
    let mut metrics: BTreeMap<String, MetricValues> = BTreeMap::new();
    seed_metrics(&mut metrics, keys, &nutrient_set);

    for (key, summary) in groups {
        for (slot, label) in labels.iter_mut().zip(key) {
            slot.push(label.clone());
        }
        households.push(summary.households_count);

        push_count(
            &mut metrics,
            schema::summary::VEHICLE_REACH_HH_COUNT,
            summary.vehicle_reach_hh_count,
        )?;
        push_value(
            &mut metrics,
            schema::summary::VEHICLE_REACH_HH_PERC,
            summary.vehicle_reach_hh_perc,
        )?;
        push_value(
            &mut metrics,
            schema::summary::MEAN_AMOUNT_AFE,
            summary.mean_amount_afe,
        )?;
        push_value(
            &mut metrics,
            schema::summary::MEDIAN_AMOUNT_AFE,
            summary.median_amount_afe,
        )?;
        push_value(
            &mut metrics,
            schema::summary::MEAN_VEHICLE_AMOUNT_AFE,
            summary.mean_vehicle_amount_afe,
        )?;
        push_value(
            &mut metrics,
            schema::summary::MEDIAN_VEHICLE_AMOUNT_AFE,
            summary.median_vehicle_amount_afe,
        )?;

        for nutrient in &nutrient_set {
            let stats = summary.supply_stats.get(*nutrient).ok_or_else(|| {
                AdequacyError::InvalidData(format!(
                    "group {key:?} has no supply statistics for nutrient '{nutrient}'"
                ))
            })?;
            push_value(
                &mut metrics,
                &schema::summary::mean_supply_column(nutrient.as_str()),
                stats.mean,
            )?;
            push_value(
                &mut metrics,
                &schema::summary::median_supply_column(nutrient.as_str()),
                stats.median,
            )?;
        }

        for indicator in keys {
            let stats = summary.indicators.get(indicator).ok_or_else(|| {
                AdequacyError::InvalidData(format!(
                    "group {key:?} has no statistics for indicator '{}'",
                    indicator.column_name()
                ))
            })?;
            let name = indicator.column_name();
            push_count(&mut metrics, &name, stats.count)?;
            push_value(
                &mut metrics,
                &schema::summary::perc_column(&name),
                stats.perc,
            )?;
        }
    }

    let mut columns: Vec<Column> =
        Vec::with_capacity(labels.len() + 1 + metrics.len());
    for (name, values) in config.aggregation_group.iter().zip(labels) {
        columns.push(Column::new(name.as_str().into(), values));
    }
    columns.push(Column::new(
        schema::summary::HOUSEHOLDS_COUNT.into(),
        households,
    ));
    for (name, values) in metrics {
        columns.push(match values {
            MetricValues::Counts(v) => Column::new(name.as_str().into(), v),
            MetricValues::Values(v) => Column::new(name.as_str().into(), v),
        });
    }

    Ok(DataFrame::new(columns)?)
}

/// Pre-register every metric column so an empty run still serializes the
/// full output schema.
fn seed_metrics(
    metrics: &mut BTreeMap<String, MetricValues>,
    keys: &BTreeSet<IndicatorKey>,
    nutrient_set: &BTreeSet<&String>,
) {
    metrics.insert(
        schema::summary::VEHICLE_REACH_HH_COUNT.to_string(),
        MetricValues::Counts(Vec::new()),
    );
    for name in [
        schema::summary::VEHICLE_REACH_HH_PERC,
        schema::summary::MEAN_AMOUNT_AFE,
        schema::summary::MEDIAN_AMOUNT_AFE,
        schema::summary::MEAN_VEHICLE_AMOUNT_AFE,
        schema::summary::MEDIAN_VEHICLE_AMOUNT_AFE,
    ] {
        metrics.insert(name.to_string(), MetricValues::Values(Vec::new()));
    }
    for nutrient in nutrient_set {
        metrics.insert(
            schema::summary::mean_supply_column(nutrient.as_str()),
            MetricValues::Values(Vec::new()),
        );
        metrics.insert(
            schema::summary::median_supply_column(nutrient.as_str()),
            MetricValues::Values(Vec::new()),
        );
    }
    for indicator in keys {
        let name = indicator.column_name();
        metrics.insert(
            schema::summary::perc_column(&name),
            MetricValues::Values(Vec::new()),
        );
        metrics.insert(name, MetricValues::Counts(Vec::new()));
    }
}

fn push_count(
    metrics: &mut BTreeMap<String, MetricValues>,
    name: &str,
    value: u32,
) -> Result<(), AdequacyError> {
    match metrics.get_mut(name) {
        Some(MetricValues::Counts(values)) => {
            values.push(value);
            Ok(())
        }
        _ => Err(AdequacyError::InvalidData(format!(
            "output column '{name}' was not registered as a count column"
        ))),
    }
}

fn push_value(
    metrics: &mut BTreeMap<String, MetricValues>,
    name: &str,
    value: f64,
) -> Result<(), AdequacyError> {
    match metrics.get_mut(name) {
        Some(MetricValues::Values(values)) => {
            values.push(value);
            Ok(())
        }
        _ => Err(AdequacyError::InvalidData(format!(
            "output column '{name}' was not registered as a value column"
        ))),
    }
}
