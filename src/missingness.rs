//! Per-value missingness classification.
//!
//! Every cell falls into exactly one of five classes, decided by an ordered
//! rule list where the first matching rule wins. Both the missingness counts
//! and the distribution statistics go through [`classify_value`], so the
//! "valid" partition is defined in one place only.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    data::{Cell, percent},
    error::{ProfileError, Result},
    sentinel::SentinelSet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueClass {
    Na,
    Empty,
    Whitespace,
    Sentinel,
    Valid,
}

type Rule = fn(&Cell, &SentinelSet) -> bool;

/// Evaluated top to bottom; a cell matching none of them is valid.
const RULES: &[(ValueClass, Rule)] = &[
    (ValueClass::Na, is_na),
    (ValueClass::Empty, is_empty),
    (ValueClass::Whitespace, is_whitespace),
    (ValueClass::Sentinel, is_sentinel),
];

fn is_na(cell: &Cell, _: &SentinelSet) -> bool {
    cell.is_missing()
}

fn is_empty(cell: &Cell, _: &SentinelSet) -> bool {
    cell.as_text().is_some_and(str::is_empty)
}

fn is_whitespace(cell: &Cell, _: &SentinelSet) -> bool {
    cell.as_text()
        .is_some_and(|text| !text.is_empty() && text.trim().is_empty())
}

fn is_sentinel(cell: &Cell, sentinels: &SentinelSet) -> bool {
    cell.as_text().is_some_and(|text| sentinels.contains(text))
}

pub fn classify_value(cell: &Cell, sentinels: &SentinelSet) -> ValueClass {
    RULES
        .iter()
        .find(|(_, rule)| rule(cell, sentinels))
        .map_or(ValueClass::Valid, |(class, _)| *class)
}

/// Trimmed text of every valid cell, in row order.
pub fn valid_values<'a>(
    values: &'a [Cell],
    sentinels: &'a SentinelSet,
) -> impl Iterator<Item = &'a str> + 'a {
    values.iter().filter_map(move |cell| match classify_value(cell, sentinels) {
        ValueClass::Valid => cell.as_text().map(str::trim),
        _ => None,
    })
}

/// Counts and shares of each value class for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Missingness {
    pub total_count: usize,
    pub valid_count: usize,
    pub na_count: usize,
    pub empty_count: usize,
    pub whitespace_count: usize,
    pub sentinel_count: usize,
    pub na_pct: f64,
    pub empty_pct: f64,
    pub whitespace_pct: f64,
    pub sentinel_pct: f64,
    pub total_missing: usize,
    pub total_missing_pct: f64,
    pub valid_pct: f64,
    pub unique_count: usize,
    /// Share of distinct values among valid values.
    pub unique_pct: f64,
}

/// Partitions every value of a column and aggregates the counts.
pub fn classify(values: &[Cell], sentinels: &SentinelSet, places: u32) -> Missingness {
    let total = values.len();
    let (mut na, mut empty, mut whitespace, mut sentinel, mut valid) = (0, 0, 0, 0, 0);
    let mut distinct: HashSet<&str> = HashSet::new();

    for cell in values {
        match classify_value(cell, sentinels) {
            ValueClass::Na => na += 1,
            ValueClass::Empty => empty += 1,
            ValueClass::Whitespace => whitespace += 1,
            ValueClass::Sentinel => sentinel += 1,
            ValueClass::Valid => {
                valid += 1;
                if let Some(text) = cell.as_text() {
                    distinct.insert(text.trim());
                }
            }
        }
    }

    let total_missing = na + empty + whitespace + sentinel;
    let unique_count = distinct.len();
    Missingness {
        total_count: total,
        valid_count: valid,
        na_count: na,
        empty_count: empty,
        whitespace_count: whitespace,
        sentinel_count: sentinel,
        na_pct: percent(na, total, places),
        empty_pct: percent(empty, total, places),
        whitespace_pct: percent(whitespace, total, places),
        sentinel_pct: percent(sentinel, total, places),
        total_missing,
        total_missing_pct: percent(total_missing, total, places),
        valid_pct: percent(valid, total, places),
        unique_count,
        unique_pct: percent(unique_count, valid, places),
    }
}

impl Missingness {
    /// Verifies the partition is exhaustive and internally consistent.
    pub fn check_invariants(&self, column: &str) -> Result<()> {
        let partitioned = self.na_count
            + self.empty_count
            + self.whitespace_count
            + self.sentinel_count
            + self.valid_count;
        if partitioned != self.total_count {
            return Err(ProfileError::invariant(
                column,
                format!(
                    "value classes sum to {partitioned}, expected {}",
                    self.total_count
                ),
            ));
        }
        if self.total_missing + self.valid_count != self.total_count {
            return Err(ProfileError::invariant(
                column,
                format!(
                    "total_missing ({}) + valid ({}) != total ({})",
                    self.total_missing, self.valid_count, self.total_count
                ),
            ));
        }
        if self.unique_count > self.valid_count {
            return Err(ProfileError::invariant(
                column,
                format!(
                    "unique_count ({}) exceeds valid_count ({})",
                    self.unique_count, self.valid_count
                ),
            ));
        }
        let shares = [
            self.na_pct,
            self.empty_pct,
            self.whitespace_pct,
            self.sentinel_pct,
            self.total_missing_pct,
            self.valid_pct,
            self.unique_pct,
        ];
        if let Some(out_of_range) = shares.iter().find(|pct| !(0.0..=100.0).contains(*pct)) {
            return Err(ProfileError::invariant(
                column,
                format!("percentage {out_of_range} outside [0, 100]"),
            ));
        }
        Ok(())
    }
}
