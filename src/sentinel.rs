//! Placeholder ("sentinel") value detection.
//!
//! Two independent heuristics are applied to the trimmed, non-blank values of
//! a column:
//!
//! - **Configured lists** (high confidence): numeric sentinels are matched
//!   exactly in numeric columns; string sentinels are matched
//!   case-insensitively in every column.
//! - **Frequency analysis** (medium confidence, numeric columns only): values
//!   made of one repeated digit (`99`, `999`, `-77`) that are frequent enough
//!   and that the configured lists did not already report.
//!
//! Sentinel percentages are always relative to the column's total row count,
//! not to the number of non-blank values.

use std::{collections::HashSet, fmt};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::ProfileConfig,
    data::{Cell, frequency_table, percent},
    types::ColumnType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ConfigList,
    FrequencyAnalysis,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DetectionMethod::ConfigList => "config_list",
            DetectionMethod::FrequencyAnalysis => "frequency_analysis",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelRecord {
    pub variable_name: String,
    pub sentinel_value: String,
    pub count: usize,
    /// Share of the column's total rows.
    pub sentinel_pct: f64,
    pub detection_method: DetectionMethod,
    pub confidence: Confidence,
}

/// The sentinel values of one column, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentinelSet {
    values: HashSet<String>,
}

impl SentinelSet {
    pub fn from_records(records: &[SentinelRecord]) -> Self {
        Self::from_values(records.iter().map(|record| record.sentinel_value.as_str()))
    }

    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            values: values.into_iter().map(normalize).collect(),
        }
    }

    /// Whether the trimmed value matches a sentinel, ignoring case.
    pub fn contains(&self, value: &str) -> bool {
        !self.values.is_empty() && self.values.contains(&normalize(value))
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Finds placeholder values in one column.
pub fn detect(
    values: &[Cell],
    column_name: &str,
    column_type: ColumnType,
    config: &ProfileConfig,
) -> Vec<SentinelRecord> {
    let total = values.len();
    let valid: Vec<&str> = values.iter().filter_map(Cell::non_blank).collect();
    if valid.is_empty() {
        return Vec::new();
    }

    let places = config.decimal_places();
    let settings = &config.sentinel_detection;
    let record = |value: &str, count: usize, method: DetectionMethod, confidence: Confidence| {
        SentinelRecord {
            variable_name: column_name.to_string(),
            sentinel_value: value.to_string(),
            count,
            sentinel_pct: percent(count, total, places),
            detection_method: method,
            confidence,
        }
    };

    let mut records = Vec::new();
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<String> = HashSet::new();

    if column_type == ColumnType::Numeric {
        for token in config.numeric_sentinel_tokens() {
            if !reported.insert(normalize(&token)) {
                continue;
            }
            let count = valid.iter().filter(|value| **value == token).count();
            if count > 0 {
                claimed.extend(valid.iter().copied().filter(|value| *value == token));
                records.push(record(&token, count, DetectionMethod::ConfigList, Confidence::High));
            }
        }
    }

    for sentinel in &settings.string_sentinels {
        let key = normalize(sentinel);
        if key.is_empty() || !reported.insert(key.clone()) {
            continue;
        }
        let count = valid
            .iter()
            .filter(|value| !claimed.contains(**value) && value.to_lowercase() == key)
            .count();
        if count > 0 {
            records.push(record(
                sentinel,
                count,
                DetectionMethod::ConfigList,
                Confidence::High,
            ));
        }
    }

    if column_type == ColumnType::Numeric {
        let table = frequency_table(valid.iter().copied());
        if table.len() <= settings.max_unique_for_detection {
            let found: HashSet<String> = records
                .iter()
                .map(|found| normalize(&found.sentinel_value))
                .collect();
            for (value, count) in table {
                let share = percent(count, total, places);
                if share >= settings.min_frequency_pct
                    && is_repeated_digit(value)
                    && !found.contains(&normalize(value))
                {
                    records.push(record(
                        value,
                        count,
                        DetectionMethod::FrequencyAnalysis,
                        Confidence::Medium,
                    ));
                }
            }
        } else {
            debug!(
                "Column '{column_name}' has {} distinct values; skipping frequency analysis",
                table.len()
            );
        }
    }

    records
}

/// Matches `^-?(d)d+$`: an optional minus sign and at least two copies of
/// one digit.
fn is_repeated_digit(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut chars = digits.chars();
    match chars.next() {
        Some(first) if first.is_ascii_digit() => {
            let mut repeats = 0usize;
            for ch in chars {
                if ch != first {
                    return false;
                }
                repeats += 1;
            }
            repeats > 0
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|value| Cell::text(*value)).collect()
    }

    #[test]
    fn repeated_digit_pattern() {
        for accepted in ["99", "999", "-77", "00", "8888"] {
            assert!(is_repeated_digit(accepted), "{accepted}");
        }
        for rejected in ["9", "-9", "98", "9.9", "--99", "", "-", "aa", "99a"] {
            assert!(!is_repeated_digit(rejected), "{rejected}");
        }
    }

    #[test]
    fn numeric_config_sentinels_use_total_row_denominator() {
        let config = ProfileConfig::default().with_numeric_sentinels(vec![999.0]);
        let mut values = cells(&["999", " 999 ", "999", "12", "13"]);
        values.push(Cell::Missing);
        values.push(Cell::text(""));
        values.push(Cell::text("14"));
        let records = detect(&values, "weight", ColumnType::Numeric, &config);
        assert_eq!(records.len(), 1);
        let found = &records[0];
        assert_eq!(found.variable_name, "weight");
        assert_eq!(found.sentinel_value, "999");
        assert_eq!(found.count, 3);
        assert_eq!(found.sentinel_pct, 37.5);
        assert_eq!(found.detection_method, DetectionMethod::ConfigList);
        assert_eq!(found.confidence, Confidence::High);
    }

    #[test]
    fn numeric_sentinels_ignored_for_non_numeric_columns() {
        let config = ProfileConfig::default().with_numeric_sentinels(vec![999.0]);
        let values = cells(&["999", "abc", "def"]);
        assert!(detect(&values, "code", ColumnType::Categorical, &config).is_empty());
    }

    #[test]
    fn string_sentinels_match_case_insensitively_in_any_column() {
        let config = ProfileConfig::default().with_string_sentinels(["UNKNOWN"]);
        let values = cells(&["unknown", "Unknown", "red", "blue"]);
        let records = detect(&values, "colour", ColumnType::Categorical, &config);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sentinel_value, "UNKNOWN");
        assert_eq!(records[0].count, 2);
        assert_eq!(records[0].sentinel_pct, 50.0);
    }

    #[test]
    fn string_sentinels_skip_values_claimed_by_numeric_match() {
        let config = ProfileConfig::default()
            .with_numeric_sentinels(vec![-1.0])
            .with_string_sentinels(["-1", "missing"]);
        let values = cells(&["-1", "-1", "5", "6", "missing"]);
        let records = detect(&values, "age", ColumnType::Numeric, &config);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sentinel_value, "-1");
        assert_eq!(records[0].count, 2);
        assert_eq!(records[1].sentinel_value, "missing");
    }

    #[test]
    fn frequency_analysis_flags_repeated_digits() {
        let config = ProfileConfig::default();
        let values = cells(&["10", "11", "99", "99", "12", "-77", "5"]);
        let records = detect(&values, "score", ColumnType::Numeric, &config);
        let flagged: Vec<&str> = records
            .iter()
            .map(|record| record.sentinel_value.as_str())
            .collect();
        assert_eq!(flagged, vec!["99", "11", "-77"]);
        assert!(records.iter().all(|record| {
            record.detection_method == DetectionMethod::FrequencyAnalysis
                && record.confidence == Confidence::Medium
        }));
    }

    #[test]
    fn frequency_analysis_skips_values_found_by_config() {
        let config = ProfileConfig::default().with_numeric_sentinels(vec![99.0]);
        let values = cells(&["99", "99", "1", "2"]);
        let records = detect(&values, "score", ColumnType::Numeric, &config);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].detection_method, DetectionMethod::ConfigList);
    }

    #[test]
    fn frequency_analysis_respects_minimum_share() {
        let config = ProfileConfig::default().with_min_frequency_pct(20.0);
        let values = cells(&["99", "1", "2", "3", "4", "5", "6", "7", "8", "10"]);
        assert!(detect(&values, "score", ColumnType::Numeric, &config).is_empty());
    }

    #[test]
    fn frequency_share_is_compared_after_rounding() {
        let mut values: Vec<Cell> = (0..199)
            .map(|idx| Cell::text((idx % 5 + 1).to_string()))
            .collect();
        values.push(Cell::text("99"));

        // 1 of 200 is 0.5%, which rounds to 1% at zero decimal places.
        let whole = ProfileConfig::default().with_decimal_places(0);
        let records = detect(&values, "score", ColumnType::Numeric, &whole);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sentinel_value, "99");
        assert_eq!(records[0].sentinel_pct, 1.0);

        let precise = ProfileConfig::default();
        assert!(detect(&values, "score", ColumnType::Numeric, &precise).is_empty());
    }

    #[test]
    fn frequency_analysis_skipped_for_high_cardinality() {
        let config = ProfileConfig::default().with_max_unique_for_detection(3);
        let values = cells(&["99", "99", "1", "2", "3"]);
        assert!(detect(&values, "score", ColumnType::Numeric, &config).is_empty());
    }

    #[test]
    fn frequency_analysis_only_for_numeric_columns() {
        let config = ProfileConfig::default();
        let values = cells(&["99", "99", "a", "b"]);
        assert!(detect(&values, "code", ColumnType::Categorical, &config).is_empty());
    }

    #[test]
    fn blank_column_yields_no_records() {
        let config = ProfileConfig::default().with_string_sentinels(["UNKNOWN"]);
        let values = vec![Cell::Missing, Cell::text("  "), Cell::text("")];
        assert!(detect(&values, "x", ColumnType::Numeric, &config).is_empty());
    }

    #[test]
    fn sentinel_set_matches_trimmed_case_insensitive() {
        let set = SentinelSet::from_values(["UNKNOWN", "999"]);
        assert!(set.contains(" unknown "));
        assert!(set.contains("999"));
        assert!(!set.contains("9999"));
        assert!(!SentinelSet::default().contains("999"));
    }
}
