//! Consumption enrichment: joins each consumption record with household
//! details and the nutrient composition table, then normalizes amounts and
//! nutrient content to the adult-female-equivalent (AFE) basis.

use std::collections::{BTreeMap, HashSet};

use polars::prelude::*;

use crate::error::AdequacyError;
use crate::fortification::FortifiableItems;
use crate::schema;

/// One consumption record after joining and AFE adjustment.
#[derive(Debug, Clone)]
pub struct EnrichedItem {
    pub household_id: String,
    pub food_id: String,
    /// Administrative label values, ordered as the caller's aggregation group.
    pub group_key: Vec<String>,
    pub amount_g: f64,
    pub amount_g_afe: f64,
    /// Absent when the row has no consumption amount (no division happened).
    pub afe_factor: Option<f64>,
    /// AFE-adjusted nutrient content per 100 g, for every requested nutrient.
    pub content_afe: BTreeMap<String, f64>,
    pub is_vehicle: bool,
    /// 0 for non-vehicle items.
    pub fortifiable_portion: f64,
}

/// Join consumption against household details and the NCT, then produce one
/// AFE-adjusted [`EnrichedItem`] per consumption row.
///
/// Fails on a consumption row whose household or food identifier does not
/// resolve, on a degenerate AFE factor for a row with consumption, and on a
/// household with a missing administrative label. Rows are never silently
/// dropped.
pub fn enrich_consumption(
    consumption: &DataFrame,
    household_details: &DataFrame,
    nct: &DataFrame,
    fortifiable: &FortifiableItems,
    aggregation_group: &[String],
    nutrients: &[String],
) -> Result<Vec<EnrichedItem>, AdequacyError> {
    require_unique_ids(
        household_details,
        "householdDetails",
        schema::household::HOUSEHOLD_ID,
    )?;
    require_unique_ids(nct, "nctTable", schema::nct::FOOD_ID)?;

    let known_households = string_id_set(household_details, schema::household::HOUSEHOLD_ID)?;
    let known_foods = string_id_set(nct, schema::nct::FOOD_ID)?;

    let enriched = join_inputs(
        consumption,
        household_details,
        nct,
        aggregation_group,
        nutrients,
    )?;

    let household_col = enriched.column(schema::consumption::HOUSEHOLD_ID)?.str()?;
    let food_col = enriched.column(schema::consumption::FOOD_ID)?.str()?;
    let amount_col = enriched
        .column(schema::consumption::AMOUNT_CONSUMED_IN_G)?
        .f64()?;
    let afe_col = enriched.column(schema::nct::AFE_FACTOR)?.f64()?;

    let mut label_cols = Vec::with_capacity(aggregation_group.len());
    for name in aggregation_group {
        label_cols.push(enriched.column(name.as_str())?.str()?);
    }
    let mut nutrient_cols = Vec::with_capacity(nutrients.len());
    for name in nutrients {
        nutrient_cols.push((name.as_str(), enriched.column(name.as_str())?.f64()?));
    }

    let mut items = Vec::with_capacity(enriched.height());
    for i in 0..enriched.height() {
        let household_id = household_col.get(i).ok_or_else(|| {
            AdequacyError::InvalidData(format!("consumption row {i} has no householdId"))
        })?;
        let food_id = food_col.get(i).ok_or_else(|| {
            AdequacyError::InvalidData(format!("consumption row {i} has no foodId"))
        })?;

        if !known_households.contains(household_id) {
            return Err(AdequacyError::InvalidData(format!(
                "consumption references householdId '{household_id}' with no \
                 householdDetails record"
            )));
        }
        if !known_foods.contains(food_id) {
            return Err(AdequacyError::InvalidData(format!(
                "consumption references foodId '{food_id}' with no nctTable record"
            )));
        }

        let mut group_key = Vec::with_capacity(label_cols.len());
        for (labels, name) in label_cols.iter().zip(aggregation_group) {
            let label = labels.get(i).ok_or_else(|| {
                AdequacyError::InvalidData(format!(
                    "household '{household_id}' has no value for group column '{name}'"
                ))
            })?;
            group_key.push(label.to_string());
        }

        let (amount_g, amount_g_afe, afe_factor, content_afe) = match amount_col.get(i) {
            Some(amount) => {
                let afe = match afe_col.get(i) {
                    Some(v) if v > 0.0 => v,
                    _ => {
                        return Err(AdequacyError::InvalidData(format!(
                            "degenerate afeFactor for foodId '{food_id}' consumed by \
                             household '{household_id}'"
                        )))
                    }
                };
                let content: BTreeMap<String, f64> = nutrient_cols
                    .iter()
                    .map(|(name, values)| {
                        (name.to_string(), values.get(i).unwrap_or(0.0) / afe)
                    })
                    .collect();
                (amount, amount / afe, Some(afe), content)
            }
            // No consumption on this row: nothing to normalize, contributes 0.
            None => (
                0.0,
                0.0,
                None,
                nutrients.iter().map(|n| (n.clone(), 0.0)).collect(),
            ),
        };

        let portion = fortifiable.portion(food_id);
        items.push(EnrichedItem {
            household_id: household_id.to_string(),
            food_id: food_id.to_string(),
            group_key,
            amount_g,
            amount_g_afe,
            afe_factor,
            content_afe,
            is_vehicle: portion.is_some(),
            fortifiable_portion: portion.unwrap_or(0.0),
        });
    }

    // Joins do not promise a row order; fix one so downstream float
    // accumulation is reproducible across runs.
    items.sort_by(|a, b| {
        a.household_id
            .cmp(&b.household_id)
            .then_with(|| a.food_id.cmp(&b.food_id))
            .then_with(|| {
                a.amount_g
                    .partial_cmp(&b.amount_g)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    Ok(items)
}

/// Left-join consumption with household details (on householdId) and the
/// NCT (on foodId), normalizing identifier columns to strings and measure
/// columns to Float64 so the join keys line up regardless of input dtypes.
fn join_inputs(
    consumption: &DataFrame,
    household_details: &DataFrame,
    nct: &DataFrame,
    aggregation_group: &[String],
    nutrients: &[String],
) -> Result<DataFrame, AdequacyError> {
    let consumption_lf = consumption.clone().lazy().select([
        col(schema::consumption::HOUSEHOLD_ID).cast(DataType::String),
        col(schema::consumption::FOOD_ID).cast(DataType::String),
        col(schema::consumption::AMOUNT_CONSUMED_IN_G).cast(DataType::Float64),
    ]);

    let mut detail_cols =
        vec![col(schema::household::HOUSEHOLD_ID).cast(DataType::String)];
    for name in aggregation_group {
        detail_cols.push(col(name.as_str()).cast(DataType::String));
    }
    let details_lf = household_details.clone().lazy().select(detail_cols);

    let mut nct_cols = vec![
        col(schema::nct::FOOD_ID).cast(DataType::String),
        col(schema::nct::AFE_FACTOR).cast(DataType::Float64),
    ];
    for name in nutrients {
        nct_cols.push(col(name.as_str()).cast(DataType::Float64));
    }
    let nct_lf = nct.clone().lazy().select(nct_cols);

    let enriched = consumption_lf
        .join(
            details_lf,
            [col(schema::consumption::HOUSEHOLD_ID)],
            [col(schema::household::HOUSEHOLD_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            nct_lf,
            [col(schema::consumption::FOOD_ID)],
            [col(schema::nct::FOOD_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    Ok(enriched)
}

fn require_unique_ids(
    df: &DataFrame,
    table: &str,
    id_column: &str,
) -> Result<(), AdequacyError> {
    let distinct = df
        .column(id_column)?
        .as_materialized_series()
        .n_unique()?;
    if distinct != df.height() {
        return Err(AdequacyError::InvalidData(format!(
            "{table} has duplicate {id_column} rows ({} rows, {distinct} distinct)",
            df.height()
        )));
    }
    Ok(())
}

fn string_id_set(df: &DataFrame, id_column: &str) -> Result<HashSet<String>, AdequacyError> {
    let cast = df
        .column(id_column)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}
