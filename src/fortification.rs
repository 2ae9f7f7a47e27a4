//! Fortification collaborators: yearly fortificant levels and the
//! fortifiable-food-items mapping for the selected vehicle.

use std::collections::HashMap;

use polars::prelude::*;

use crate::error::AdequacyError;
use crate::schema;

/// Yearly average fortificant addition, in mg per 100 g of vehicle.
///
/// Retrieval of the underlying averages is outside the pipeline; the core
/// only consumes this lookup. A missing level means "no contribution for
/// that (vehicle, year, nutrient)", not an error.
pub trait FortificationLevels {
    fn level(&self, vehicle: &str, year: i32, nutrient: &str) -> Option<f64>;
}

/// Map-backed [`FortificationLevels`] for callers that materialize the
/// yearly averages up front.
#[derive(Debug, Clone, Default)]
pub struct StaticFortificationLevels {
    levels: HashMap<(String, i32, String), f64>,
}

impl StaticFortificationLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, vehicle: &str, year: i32, nutrient: &str, mg_per_100g: f64) {
        self.levels
            .insert((vehicle.to_string(), year, nutrient.to_string()), mg_per_100g);
    }
}

impl FortificationLevels for StaticFortificationLevels {
    fn level(&self, vehicle: &str, year: i32, nutrient: &str) -> Option<f64> {
        self.levels
            .get(&(vehicle.to_string(), year, nutrient.to_string()))
            .copied()
    }
}

/// Fortifiable food items for a single selected vehicle.
///
/// Parsed once per run from the fortifiable-food-items table; rows for
/// other vehicles are dropped. A food absent from the mapping is simply
/// not a vehicle item.
#[derive(Debug, Clone)]
pub struct FortifiableItems {
    vehicle: String,
    portions: HashMap<String, f64>,
}

impl FortifiableItems {
    /// Parse the table, keeping only rows whose vehicle name matches.
    ///
    /// A matching row with a missing portion, a portion outside 0–100, or
    /// a duplicated food identifier is invalid data.
    pub fn from_frame(df: &DataFrame, vehicle: &str) -> Result<Self, AdequacyError> {
        let food_col = df
            .column(schema::fortifiable::FOOD_ID)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let food_col = food_col.str()?;
        let vehicle_col = df
            .column(schema::fortifiable::FOOD_VEHICLE_NAME)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let vehicle_col = vehicle_col.str()?;
        let portion_col = df
            .column(schema::fortifiable::FORTIFIABLE_PORTION)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let portion_col = portion_col.f64()?;

        let mut portions: HashMap<String, f64> = HashMap::new();
        for i in 0..df.height() {
            if vehicle_col.get(i) != Some(vehicle) {
                continue;
            }
            let Some(food_id) = food_col.get(i) else {
                return Err(AdequacyError::InvalidData(format!(
                    "fortifiableFoodItems row {i} for vehicle '{vehicle}' has no foodId"
                )));
            };
            let portion = portion_col.get(i).ok_or_else(|| {
                AdequacyError::InvalidData(format!(
                    "fortifiableFoodItems: missing fortifiablePortion for foodId '{food_id}'"
                ))
            })?;
            if !(0.0..=100.0).contains(&portion) {
                return Err(AdequacyError::InvalidData(format!(
                    "fortifiableFoodItems: fortifiablePortion {portion} for foodId \
                     '{food_id}' is outside 0-100"
                )));
            }
            if portions.insert(food_id.to_string(), portion).is_some() {
                return Err(AdequacyError::InvalidData(format!(
                    "fortifiableFoodItems: duplicate foodId '{food_id}' for vehicle '{vehicle}'"
                )));
            }
        }

        Ok(Self {
            vehicle: vehicle.to_string(),
            portions,
        })
    }

    pub fn vehicle(&self) -> &str {
        &self.vehicle
    }

    /// Fortifiable portion (0–100) for a vehicle item, `None` otherwise.
    pub fn portion(&self, food_id: &str) -> Option<f64> {
        self.portions.get(food_id).copied()
    }
}
