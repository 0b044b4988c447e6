//! Distribution statistics over the valid values of a column.
//!
//! Numeric columns get order statistics and moments; every other logical
//! type gets a frequency table. The valid partition comes from
//! [`crate::missingness::valid_values`], the same classifier that produces
//! the missingness counts.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    config::ProfileConfig,
    data::{Cell, frequency_table, parse_number, percent, round_to},
    missingness::valid_values,
    sentinel::SentinelSet,
    types::ColumnType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionType {
    Numeric,
    Categorical,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
    /// Share of the values the distribution was computed over.
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; absent below two values.
    pub sd: Option<f64>,
    pub q25: f64,
    pub q75: f64,
    pub iqr: f64,
}

/// Numeric and categorical parts are mutually exclusive; `None` marks the
/// part that does not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionResult {
    pub variable_name: String,
    pub distribution_type: DistributionType,
    /// Number of values the statistics were computed over.
    pub n: usize,
    pub numeric: Option<NumericSummary>,
    pub top_values: Option<Vec<FrequencyEntry>>,
    pub mode: Option<FrequencyEntry>,
}

impl DistributionResult {
    pub fn none(variable_name: &str) -> Self {
        Self {
            variable_name: variable_name.to_string(),
            distribution_type: DistributionType::None,
            n: 0,
            numeric: None,
            top_values: None,
            mode: None,
        }
    }
}

pub fn compute(
    values: &[Cell],
    column_name: &str,
    column_type: ColumnType,
    sentinels: &SentinelSet,
    config: &ProfileConfig,
) -> DistributionResult {
    let valid: Vec<&str> = valid_values(values, sentinels).collect();
    if valid.is_empty() {
        return DistributionResult::none(column_name);
    }
    match column_type {
        ColumnType::Numeric => numeric_distribution(&valid, column_name, config.decimal_places()),
        ColumnType::Categorical | ColumnType::Date | ColumnType::Identifier => {
            categorical_distribution(&valid, column_name, config)
        }
    }
}

fn numeric_distribution(valid: &[&str], column_name: &str, places: u32) -> DistributionResult {
    let parsed: Vec<(&str, f64)> = valid
        .iter()
        .filter_map(|raw| parse_number(raw).map(|number| (*raw, number)))
        .collect();
    if parsed.is_empty() {
        return DistributionResult::none(column_name);
    }

    let sorted: Vec<f64> = parsed
        .iter()
        .map(|(_, number)| *number)
        .sorted_by(f64::total_cmp)
        .collect();
    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let sd = (n > 1).then(|| {
        let squares: f64 = sorted.iter().map(|value| (value - mean).powi(2)).sum();
        (squares / (n - 1) as f64).sqrt()
    });
    let q25 = quantile(&sorted, 0.25);
    let q75 = quantile(&sorted, 0.75);

    let summary = NumericSummary {
        min: round_to(sorted[0], places),
        max: round_to(sorted[n - 1], places),
        mean: round_to(mean, places),
        median: round_to(quantile(&sorted, 0.5), places),
        sd: sd.map(|value| round_to(value, places)),
        q25: round_to(q25, places),
        q75: round_to(q75, places),
        iqr: round_to(q75 - q25, places),
    };

    let mode = frequency_table(parsed.iter().map(|(raw, _)| *raw))
        .into_iter()
        .next()
        .map(|(value, count)| FrequencyEntry {
            value: value.to_string(),
            count,
            pct: percent(count, n, places),
        });

    DistributionResult {
        variable_name: column_name.to_string(),
        distribution_type: DistributionType::Numeric,
        n,
        numeric: Some(summary),
        top_values: None,
        mode,
    }
}

fn categorical_distribution(
    valid: &[&str],
    column_name: &str,
    config: &ProfileConfig,
) -> DistributionResult {
    let n = valid.len();
    let places = config.decimal_places();
    let top_values: Vec<FrequencyEntry> = frequency_table(valid.iter().copied())
        .into_iter()
        .take(config.display.top_n_categories)
        .map(|(value, count)| FrequencyEntry {
            value: value.to_string(),
            count,
            pct: percent(count, n, places),
        })
        .collect();
    let mode = top_values.first().cloned();

    DistributionResult {
        variable_name: column_name.to_string(),
        distribution_type: DistributionType::Categorical,
        n,
        numeric: None,
        top_values: Some(top_values),
        mode,
    }
}

/// Quantile of ascending `sorted` values by linear interpolation between the
/// closest ranks (`h = (n - 1) * p`).
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    sorted[lower] + (h - lower as f64) * (sorted[upper] - sorted[lower])
}
