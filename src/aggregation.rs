//! Grouped summary statistics over per-household supplies and indicators.
//!
//! Group identity is the ordered tuple of administrative label values.
//! Each summary is computed independently into a map keyed by that tuple,
//! then the maps are merged by key; a key present in one summary and absent
//! from another is a join-key mismatch and fails the run.

use std::collections::BTreeMap;

use crate::adequacy::{HouseholdAdequacy, IndicatorKey};
use crate::error::AdequacyError;
use crate::supply::{HouseholdSupply, SupplyMetric};

/// Ordered tuple of administrative label values.
pub type GroupKey = Vec<String>;

/// Mean/median of per-household baseline supply, rounded to 0 decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyStats {
    pub mean: f64,
    pub median: f64,
}

/// Household count in an adequacy state, with its share of the group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorStats {
    pub count: u32,
    pub perc: f64,
}

#[derive(Debug, Clone)]
pub struct GroupSummary {
    pub households_count: u32,
    pub vehicle_reach_hh_count: u32,
    pub vehicle_reach_hh_perc: f64,
    pub mean_amount_afe: f64,
    pub median_amount_afe: f64,
    pub mean_vehicle_amount_afe: f64,
    pub median_vehicle_amount_afe: f64,
    /// Keyed by nutrient.
    pub supply_stats: BTreeMap<String, SupplyStats>,
    pub indicators: BTreeMap<IndicatorKey, IndicatorStats>,
}

/// Aggregate per-household records into one summary per group.
///
/// `supplies` and `adequacies` describe the same households; percentages
/// are `round(count * 100 / householdsCount, 2)`.
pub fn aggregate(
    supplies: &[HouseholdSupply],
    adequacies: &[HouseholdAdequacy],
) -> Result<BTreeMap<GroupKey, GroupSummary>, AdequacyError> {
    let counts = household_counts(supplies);
    let reach = vehicle_reach(supplies);
    let consumption = consumption_stats(supplies);
    let supply = supply_stats(supplies);
    let indicators = indicator_counts(adequacies);

    let mut out = BTreeMap::new();
    for (key, households_count) in counts {
        let reach_count = *lookup(&reach, &key, "vehicle reach")?;
        let stats = lookup(&consumption, &key, "consumption")?;
        let per_nutrient = lookup(&supply, &key, "supply")?;
        let per_indicator = lookup(&indicators, &key, "indicator")?;

        let indicator_stats = per_indicator
            .iter()
            .map(|(ind, count)| {
                let stats = IndicatorStats {
                    count: *count,
                    perc: percentage(*count, households_count),
                };
                (ind.clone(), stats)
            })
            .collect();

        out.insert(
            key,
            GroupSummary {
                households_count,
                vehicle_reach_hh_count: reach_count,
                vehicle_reach_hh_perc: percentage(reach_count, households_count),
                mean_amount_afe: stats.mean_amount,
                median_amount_afe: stats.median_amount,
                mean_vehicle_amount_afe: stats.mean_vehicle_amount,
                median_vehicle_amount_afe: stats.median_vehicle_amount,
                supply_stats: per_nutrient.clone(),
                indicators: indicator_stats,
            },
        );
    }

    // The indicator summary comes from a different input slice; make sure it
    // carries no group the household counts never saw.
    for key in indicators.keys() {
        if !out.contains_key(key) {
            return Err(AdequacyError::InvalidData(format!(
                "group {key:?} appears in the indicator summary but not in the \
                 household counts"
            )));
        }
    }

    Ok(out)
}

fn lookup<'a, T>(
    map: &'a BTreeMap<GroupKey, T>,
    key: &GroupKey,
    summary: &str,
) -> Result<&'a T, AdequacyError> {
    map.get(key).ok_or_else(|| {
        AdequacyError::InvalidData(format!(
            "group {key:?} is missing from the {summary} summary (join-key mismatch)"
        ))
    })
}

fn household_counts(supplies: &[HouseholdSupply]) -> BTreeMap<GroupKey, u32> {
    let mut counts: BTreeMap<GroupKey, u32> = BTreeMap::new();
    for household in supplies {
        *counts.entry(household.group_key.clone()).or_insert(0) += 1;
    }
    counts
}

fn vehicle_reach(supplies: &[HouseholdSupply]) -> BTreeMap<GroupKey, u32> {
    let mut counts: BTreeMap<GroupKey, u32> = BTreeMap::new();
    for household in supplies {
        let entry = counts.entry(household.group_key.clone()).or_insert(0);
        if household.consumes_vehicle {
            *entry += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, Copy)]
struct ConsumptionStats {
    mean_amount: f64,
    median_amount: f64,
    mean_vehicle_amount: f64,
    median_vehicle_amount: f64,
}

/// Mean/median of per-household consumption totals.
///
/// The per-household totals were already summed per household upstream, so
/// households with many items do not weigh more than single-item ones.
/// Households without vehicle consumption enter the vehicle statistics as 0.
fn consumption_stats(supplies: &[HouseholdSupply]) -> BTreeMap<GroupKey, ConsumptionStats> {
    let mut amounts: BTreeMap<GroupKey, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for household in supplies {
        let entry = amounts.entry(household.group_key.clone()).or_default();
        entry.0.push(household.amount_afe_total);
        entry.1.push(household.vehicle_amount_afe_total);
    }

    amounts
        .into_iter()
        .map(|(key, (all, vehicle))| {
            let stats = ConsumptionStats {
                mean_amount: mean(&all),
                median_amount: median(&all),
                mean_vehicle_amount: mean(&vehicle),
                median_vehicle_amount: median(&vehicle),
            };
            (key, stats)
        })
        .collect()
}

fn supply_stats(
    supplies: &[HouseholdSupply],
) -> BTreeMap<GroupKey, BTreeMap<String, SupplyStats>> {
    let mut values: BTreeMap<GroupKey, BTreeMap<String, Vec<f64>>> = BTreeMap::new();
    for household in supplies {
        let entry = values.entry(household.group_key.clone()).or_default();
        for (key, value) in &household.supply {
            if key.metric == SupplyMetric::Base {
                entry.entry(key.nutrient.clone()).or_default().push(*value);
            }
        }
    }

    values
        .into_iter()
        .map(|(key, per_nutrient)| {
            let stats = per_nutrient
                .into_iter()
                .map(|(nutrient, base_values)| {
                    let stats = SupplyStats {
                        mean: mean(&base_values).round(),
                        median: median(&base_values).round(),
                    };
                    (nutrient, stats)
                })
                .collect();
            (key, stats)
        })
        .collect()
}

fn indicator_counts(
    adequacies: &[HouseholdAdequacy],
) -> BTreeMap<GroupKey, BTreeMap<IndicatorKey, u32>> {
    let mut counts: BTreeMap<GroupKey, BTreeMap<IndicatorKey, u32>> = BTreeMap::new();
    for household in adequacies {
        let entry = counts.entry(household.group_key.clone()).or_default();
        for (key, flag) in &household.indicators {
            *entry.entry(key.clone()).or_insert(0) += u32::from(*flag);
        }
    }
    counts
}

pub(crate) fn percentage(count: u32, households_count: u32) -> f64 {
    if households_count == 0 {
        return 0.0;
    }
    round_to(f64::from(count) * 100.0 / f64::from(households_count), 2)
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
