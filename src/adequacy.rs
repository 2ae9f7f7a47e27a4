//! Per-household adequacy classification against EAR and UL thresholds.

use std::collections::{BTreeMap, BTreeSet};

use crate::supply::{HouseholdSupply, SupplyKey};
use crate::thresholds::{NutrientThresholds, ThresholdKind};

/// Which supply quantity an indicator is judged against.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SupplyScope {
    Base,
    BaseAndLsff(i32),
}

/// Identity of one inadequacy/exceedance indicator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndicatorKey {
    pub nutrient: String,
    pub scope: SupplyScope,
    pub kind: ThresholdKind,
}

impl IndicatorKey {
    /// The supply map entry this indicator reads.
    pub fn supply_key(&self) -> SupplyKey {
        match self.scope {
            SupplyScope::Base => SupplyKey::base(&self.nutrient),
            SupplyScope::BaseAndLsff(year) => SupplyKey::total(&self.nutrient, year),
        }
    }

    /// Output column name. Only the serialization boundary calls this.
    pub fn column_name(&self) -> String {
        let n = &self.nutrient;
        match (&self.scope, self.kind) {
            (SupplyScope::Base, ThresholdKind::Ear) => {
                format!("{n}_base_supply_ear_inadequacy")
            }
            (SupplyScope::BaseAndLsff(year), ThresholdKind::Ear) => {
                format!("{n}_{year}_base_and_lsff_ear_inadequacy")
            }
            (SupplyScope::Base, ThresholdKind::Ul) => format!("{n}_base_ul_exceedance"),
            (SupplyScope::BaseAndLsff(year), ThresholdKind::Ul) => {
                format!("{n}_{year}_base_and_lsff_ul_exceedance")
            }
        }
    }
}

/// Per-household 0/1 indicators.
#[derive(Debug, Clone)]
pub struct HouseholdAdequacy {
    pub household_id: String,
    pub group_key: Vec<String>,
    pub indicators: BTreeMap<IndicatorKey, u8>,
}

/// The indicator keys a run produces.
///
/// A nutrient contributes inadequacy keys only when its EAR is defined and
/// exceedance keys only when its UL is defined; a nutrient with neither
/// produces no keys at all.
pub fn indicator_keys(
    thresholds: &NutrientThresholds,
    nutrients: &[String],
    years: &[i32],
) -> BTreeSet<IndicatorKey> {
    let mut keys = BTreeSet::new();
    for nutrient in nutrients {
        for kind in [ThresholdKind::Ear, ThresholdKind::Ul] {
            if thresholds.get(nutrient, kind).is_none() {
                tracing::debug!(
                    nutrient = %nutrient,
                    ?kind,
                    "no threshold defined; indicator suppressed"
                );
                continue;
            }
            keys.insert(IndicatorKey {
                nutrient: nutrient.clone(),
                scope: SupplyScope::Base,
                kind,
            });
            for year in years {
                keys.insert(IndicatorKey {
                    nutrient: nutrient.clone(),
                    scope: SupplyScope::BaseAndLsff(*year),
                    kind,
                });
            }
        }
    }
    keys
}

/// Classify every household against every indicator key.
///
/// EAR comparison is strict: supply below the EAR is inadequate, supply
/// equal to it is adequate. UL likewise: only supply strictly above the UL
/// is exceedance. Produces a fresh structure per household; the supply
/// stage's output is left untouched.
pub fn classify(
    supplies: &[HouseholdSupply],
    thresholds: &NutrientThresholds,
    keys: &BTreeSet<IndicatorKey>,
) -> Vec<HouseholdAdequacy> {
    supplies
        .iter()
        .map(|household| {
            let mut indicators = BTreeMap::new();
            for key in keys {
                let Some(limit) = thresholds.get(&key.nutrient, key.kind) else {
                    continue;
                };
                let supply = household
                    .supply
                    .get(&key.supply_key())
                    .copied()
                    .unwrap_or(0.0);
                let flagged = match key.kind {
                    ThresholdKind::Ear => supply < limit,
                    ThresholdKind::Ul => supply > limit,
                };
                indicators.insert(key.clone(), u8::from(flagged));
            }
            HouseholdAdequacy {
                household_id: household.household_id.clone(),
                group_key: household.group_key.clone(),
                indicators,
            }
        })
        .collect()
}
