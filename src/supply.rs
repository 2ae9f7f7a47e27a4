//! Per-household nutrient supply projection.
//!
//! Supplies are held in a map keyed by (nutrient, metric) tuples; named
//! columns only exist at the output serialization boundary.

use std::collections::{BTreeMap, HashSet};

use crate::enrich::EnrichedItem;
use crate::fortification::FortificationLevels;

/// One projected supply quantity for a household.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SupplyMetric {
    /// Baseline dietary supply.
    Base,
    /// Incremental fortification supply for a projection year.
    Lsff(i32),
    /// Baseline plus fortification for a projection year.
    BaseAndLsffTotal(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SupplyKey {
    pub nutrient: String,
    pub metric: SupplyMetric,
}

impl SupplyKey {
    pub fn base(nutrient: &str) -> Self {
        Self {
            nutrient: nutrient.to_string(),
            metric: SupplyMetric::Base,
        }
    }

    pub fn lsff(nutrient: &str, year: i32) -> Self {
        Self {
            nutrient: nutrient.to_string(),
            metric: SupplyMetric::Lsff(year),
        }
    }

    pub fn total(nutrient: &str, year: i32) -> Self {
        Self {
            nutrient: nutrient.to_string(),
            metric: SupplyMetric::BaseAndLsffTotal(year),
        }
    }
}

/// Per-household supply totals and consumption rollups.
#[derive(Debug, Clone)]
pub struct HouseholdSupply {
    pub household_id: String,
    pub group_key: Vec<String>,
    /// Sum of AFE-adjusted grams consumed, over all items.
    pub amount_afe_total: f64,
    /// Sum of AFE-adjusted grams consumed, over vehicle items only.
    pub vehicle_amount_afe_total: f64,
    pub consumes_vehicle: bool,
    pub supply: BTreeMap<SupplyKey, f64>,
}

/// Roll enriched consumption items up to per-household supply totals.
///
/// Per item and nutrient: `base = afeAdjustedContent * amountConsumedInG / 100`.
/// Per projection year, vehicle items add
/// `base * level(vehicle, year, nutrient) * fortifiablePortion / 100`;
/// a missing level contributes 0. Every household materializes the full
/// (nutrient × metric) key set so an unconsumed nutrient reads as 0 supply
/// downstream. Values do not depend on nutrient or year iteration order.
pub fn project_supplies(
    items: &[EnrichedItem],
    levels: &dyn FortificationLevels,
    vehicle: &str,
    years: &[i32],
    nutrients: &[String],
) -> Vec<HouseholdSupply> {
    let mut households: BTreeMap<String, HouseholdSupply> = BTreeMap::new();
    let mut missing_levels: HashSet<(i32, String)> = HashSet::new();

    for item in items {
        let entry = households
            .entry(item.household_id.clone())
            .or_insert_with(|| HouseholdSupply {
                household_id: item.household_id.clone(),
                group_key: item.group_key.clone(),
                amount_afe_total: 0.0,
                vehicle_amount_afe_total: 0.0,
                consumes_vehicle: false,
                supply: BTreeMap::new(),
            });

        entry.amount_afe_total += item.amount_g_afe;
        if item.is_vehicle {
            entry.consumes_vehicle = true;
            entry.vehicle_amount_afe_total += item.amount_g_afe;
        }

        for nutrient in nutrients {
            let content_afe = item.content_afe.get(nutrient).copied().unwrap_or(0.0);
            let base_item = content_afe * item.amount_g / 100.0;
            *entry.supply.entry(SupplyKey::base(nutrient)).or_insert(0.0) += base_item;

            for year in years {
                let lsff_item = if item.is_vehicle {
                    match levels.level(vehicle, *year, nutrient) {
                        Some(level) => base_item * level * item.fortifiable_portion / 100.0,
                        None => {
                            if missing_levels.insert((*year, nutrient.clone())) {
                                tracing::warn!(
                                    vehicle,
                                    year = *year,
                                    nutrient = %nutrient,
                                    "no fortification level defined; treating as zero \
                                     contribution"
                                );
                            }
                            0.0
                        }
                    }
                } else {
                    0.0
                };
                *entry
                    .supply
                    .entry(SupplyKey::lsff(nutrient, *year))
                    .or_insert(0.0) += lsff_item;
            }
        }
    }

    for household in households.values_mut() {
        for nutrient in nutrients {
            let base = household
                .supply
                .get(&SupplyKey::base(nutrient))
                .copied()
                .unwrap_or(0.0);
            for year in years {
                let lsff = household
                    .supply
                    .get(&SupplyKey::lsff(nutrient, *year))
                    .copied()
                    .unwrap_or(0.0);
                household
                    .supply
                    .insert(SupplyKey::total(nutrient, *year), base + lsff);
            }
        }
    }

    households.into_values().collect()
}
