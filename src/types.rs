//! Logical type inference for a single column.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    config::ProfileConfig,
    data::{Cell, parse_naive_date, parse_number},
};

/// Share of non-missing values that must parse as numbers (strictly more than).
const NUMERIC_THRESHOLD: f64 = 0.90;
/// Share of the date sample that must parse as dates (strictly more than).
const DATE_THRESHOLD: f64 = 0.80;
const DATE_SAMPLE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Identifier,
    Numeric,
    Date,
    Categorical,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Identifier => "identifier",
            ColumnType::Numeric => "numeric",
            ColumnType::Date => "date",
            ColumnType::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infers the logical type of a column. First match wins:
/// identifier by name, numeric, date, then categorical.
pub fn infer(values: &[Cell], column_name: &str, config: &ProfileConfig) -> ColumnType {
    if config.is_identifier(column_name) {
        return ColumnType::Identifier;
    }

    let present: Vec<&str> = values.iter().filter_map(Cell::non_blank).collect();
    if present.is_empty() {
        return ColumnType::Categorical;
    }

    let numeric = present
        .iter()
        .filter(|value| parse_number(value).is_some())
        .count();
    if exceeds(numeric, present.len(), NUMERIC_THRESHOLD) {
        return ColumnType::Numeric;
    }

    let sample = &present[..present.len().min(DATE_SAMPLE_SIZE)];
    let dates = sample
        .iter()
        .filter(|value| parse_naive_date(value).is_ok())
        .count();
    if exceeds(dates, sample.len(), DATE_THRESHOLD) {
        return ColumnType::Date;
    }

    ColumnType::Categorical
}

fn exceeds(matches: usize, total: usize, threshold: f64) -> bool {
    total > 0 && matches as f64 / total as f64 > threshold
}
