//! EAR / UL threshold lookup.
//!
//! Thresholds arrive as a caller-supplied table with one row per nutrient.
//! Either value may be absent for a nutrient; absence means "no indicator
//! of that kind is produced", never an error.

use std::collections::HashMap;

use polars::prelude::*;

use crate::error::AdequacyError;
use crate::schema;

/// Which threshold value to resolve for a nutrient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThresholdKind {
    /// Estimated average requirement: supply below it is inadequate.
    Ear,
    /// Upper limit: supply above it is exceedance.
    Ul,
}

#[derive(Debug, Clone, Copy, Default)]
struct ThresholdEntry {
    ear: Option<f64>,
    ul: Option<f64>,
}

/// Parsed thresholds table, keyed by nutrient code.
#[derive(Debug, Clone, Default)]
pub struct NutrientThresholds {
    entries: HashMap<String, ThresholdEntry>,
}

impl NutrientThresholds {
    /// Parse a thresholds DataFrame.
    ///
    /// Required columns: `nutrient`, `ear` (or the legacy `CND`), `ul`.
    /// Values that are null or non-numeric are treated as absent.
    /// The first row wins when a nutrient appears more than once.
    pub fn from_frame(df: &DataFrame) -> Result<Self, AdequacyError> {
        let nutrient_col = df
            .column(schema::thresholds::NUTRIENT)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let nutrient_col = nutrient_col.str()?;

        let ear_col = numeric_column(df, ear_column_name(df)?)?;
        let ul_col = numeric_column(df, schema::thresholds::UL)?;

        let mut entries: HashMap<String, ThresholdEntry> = HashMap::new();
        for i in 0..df.height() {
            let Some(nutrient) = nutrient_col.get(i) else {
                continue;
            };
            entries
                .entry(nutrient.to_string())
                .or_insert(ThresholdEntry {
                    ear: ear_col.get(i),
                    ul: ul_col.get(i),
                });
        }

        Ok(Self { entries })
    }

    /// Resolve a threshold value, `None` for an unknown nutrient or an
    /// absent stored value.
    pub fn get(&self, nutrient: &str, kind: ThresholdKind) -> Option<f64> {
        let entry = self.entries.get(nutrient)?;
        match kind {
            ThresholdKind::Ear => entry.ear,
            ThresholdKind::Ul => entry.ul,
        }
    }
}

/// Resolve a single threshold value straight from the table.
///
/// Returns `Ok(None)` when no row matches the nutrient or the stored value
/// is itself missing. Never fails on an unknown nutrient.
pub fn threshold(
    table: &DataFrame,
    nutrient: &str,
    kind: ThresholdKind,
) -> Result<Option<f64>, AdequacyError> {
    Ok(NutrientThresholds::from_frame(table)?.get(nutrient, kind))
}

/// The effective EAR column name: `ear`, or the legacy `CND` alias.
fn ear_column_name(df: &DataFrame) -> Result<&'static str, AdequacyError> {
    if df.column(schema::thresholds::EAR).is_ok() {
        Ok(schema::thresholds::EAR)
    } else if df.column(schema::thresholds::EAR_LEGACY).is_ok() {
        Ok(schema::thresholds::EAR_LEGACY)
    } else {
        Err(AdequacyError::MissingColumns {
            table: "intakeThresholds".to_string(),
            columns: vec![schema::thresholds::EAR.to_string()],
        })
    }
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Float64Chunked, AdequacyError> {
    let cast = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(cast.f64()?.clone())
}
