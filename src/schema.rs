//! Column-name constants for the adequacy pipeline schema.
//! Single source of truth for input validation and output serialization.

use polars::prelude::DataFrame;

use crate::error::AdequacyError;

// ── Consumption columns ─────────────────────────────────────────────────────
pub mod consumption {
    pub const HOUSEHOLD_ID: &str = "householdId";
    pub const FOOD_ID: &str = "foodId";
    pub const AMOUNT_CONSUMED_IN_G: &str = "amountConsumedInG";

    pub const REQUIRED: [&str; 3] = [HOUSEHOLD_ID, FOOD_ID, AMOUNT_CONSUMED_IN_G];
}

// ── Household details columns ───────────────────────────────────────────────
pub mod household {
    pub const HOUSEHOLD_ID: &str = "householdId";
    pub const MEMBER_COUNT: &str = "memberCount";

    pub const REQUIRED: [&str; 2] = [HOUSEHOLD_ID, MEMBER_COUNT];
}

// ── Nutrient composition table columns ──────────────────────────────────────
pub mod nct {
    pub const FOOD_ID: &str = "foodId";
    pub const AFE_FACTOR: &str = "afeFactor";

    pub const REQUIRED: [&str; 2] = [FOOD_ID, AFE_FACTOR];
}

// ── Fortifiable food items columns ──────────────────────────────────────────
pub mod fortifiable {
    pub const FOOD_ID: &str = "foodId";
    pub const FOOD_VEHICLE_NAME: &str = "foodVehicleName";
    pub const FORTIFIABLE_PORTION: &str = "fortifiablePortion";

    pub const REQUIRED: [&str; 3] = [FOOD_ID, FOOD_VEHICLE_NAME, FORTIFIABLE_PORTION];
}

// ── Intake thresholds columns ───────────────────────────────────────────────
pub mod thresholds {
    pub const NUTRIENT: &str = "nutrient";
    pub const EAR: &str = "ear";
    /// Legacy name for the EAR column, accepted when `ear` is absent.
    pub const EAR_LEGACY: &str = "CND";
    pub const UL: &str = "ul";
}

// ── Summary output columns ──────────────────────────────────────────────────
pub mod summary {
    pub const HOUSEHOLDS_COUNT: &str = "householdsCount";
    pub const VEHICLE_REACH_HH_COUNT: &str = "fortification_vehicle_reach_hh_count";
    pub const VEHICLE_REACH_HH_PERC: &str = "fortification_vehicle_reach_hh_perc";
    pub const MEAN_AMOUNT_AFE: &str = "mean_amountConsumedInGAfe";
    pub const MEDIAN_AMOUNT_AFE: &str = "median_amountConsumedInGAfe";
    pub const MEAN_VEHICLE_AMOUNT_AFE: &str = "mean_fortification_vehicle_amountConsumedInGAfe";
    pub const MEDIAN_VEHICLE_AMOUNT_AFE: &str = "median_fortification_vehicle_amountConsumedInGAfe";

    /// Suffix appended to a count column to name its percentage column.
    pub const PERC_SUFFIX: &str = "_perc";

    pub fn mean_supply_column(nutrient: &str) -> String {
        format!("{nutrient}_MeanSupply")
    }

    pub fn median_supply_column(nutrient: &str) -> String {
        format!("{nutrient}_MedianSupply")
    }

    pub fn perc_column(count_column: &str) -> String {
        format!("{count_column}{PERC_SUFFIX}")
    }
}

/// Check that `df` carries every column in `required`.
///
/// Collects all missing names so the caller sees the full list at once
/// rather than one failure per run.
pub fn require_columns(
    df: &DataFrame,
    table: &str,
    required: &[&str],
) -> Result<(), AdequacyError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| df.column(name).is_err())
        .map(|name| (*name).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AdequacyError::MissingColumns {
            table: table.to_string(),
            columns: missing,
        })
    }
}
