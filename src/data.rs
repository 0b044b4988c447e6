//! In-memory table snapshot model and the low-level value parsers shared by
//! every profiling stage.
//!
//! Cells are stored as raw text regardless of their logical type. The only
//! other state a cell can be in is an explicit missing marker; the inferred
//! type lives alongside the column as metadata, never inside the cell.

use std::collections::HashMap;

use anyhow::{Result as AnyResult, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Missing,
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value.as_str()),
            Cell::Missing => None,
        }
    }

    /// Text with surrounding whitespace removed; `None` for missing or blank cells.
    pub fn non_blank(&self) -> Option<&str> {
        self.as_text()
            .map(str::trim)
            .filter(|trimmed| !trimmed.is_empty())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Missing, Into::into)
    }
}

/// All values of one column of one table snapshot, in row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnValues {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl ColumnValues {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Convenience constructor for tests and fixtures: `None` becomes missing.
    pub fn from_options<'a, I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        Self::new(name, values.into_iter().map(Cell::from).collect())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A full set of rows and columns for one table at one point in ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub name: String,
    columns: Vec<ColumnValues>,
    row_count: usize,
}

impl TableSnapshot {
    /// Builds a snapshot from column-major data. All columns must share one length.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnValues>) -> Result<Self> {
        let name = name.into();
        let row_count = columns.first().map_or(0, ColumnValues::len);
        if let Some(ragged) = columns.iter().find(|column| column.len() != row_count) {
            return Err(ProfileError::input(
                format!("table '{name}'"),
                format!(
                    "column '{}' has {} value(s) but the table has {row_count} row(s)",
                    ragged.name,
                    ragged.len()
                ),
            ));
        }
        Ok(Self {
            name,
            columns,
            row_count,
        })
    }

    /// Builds a snapshot from row-major data; rows shorter than the header
    /// are padded with missing cells.
    pub fn from_rows(
        name: impl Into<String>,
        headers: &[String],
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self> {
        let name = name.into();
        let mut columns: Vec<ColumnValues> = headers
            .iter()
            .map(|header| ColumnValues::new(header.clone(), Vec::with_capacity(rows.len())))
            .collect();
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() > headers.len() {
                return Err(ProfileError::input(
                    format!("table '{name}' row {}", row_idx + 1),
                    format!(
                        "found {} field(s) but the header defines {}",
                        row.len(),
                        headers.len()
                    ),
                ));
            }
            let mut cells = row.into_iter();
            for column in &mut columns {
                column.cells.push(cells.next().unwrap_or(Cell::Missing));
            }
        }
        Self::new(name, columns)
    }

    pub fn columns(&self) -> &[ColumnValues] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnValues> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Parses trimmed text as a finite number.
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}

/// Canonical text form of a configured numeric value (`999`, `-99`, `99.5`).
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%Y%m%d", "%d-%b-%Y", "%d %b %Y",
    "%b %d, %Y", "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

pub fn parse_naive_date(value: &str) -> AnyResult<NaiveDate> {
    let value = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed.date());
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    // Magnitudes beyond Decimal's range carry no fractional digits.
    Decimal::from_f64(value)
        .map(|decimal| {
            decimal.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
        })
        .and_then(|decimal| decimal.to_f64())
        .unwrap_or(value)
}

/// `count / total * 100` rounded to `places`; 0 when `total` is 0.
pub fn percent(count: usize, total: usize, places: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(count as f64 / total as f64 * 100.0, places)
}

/// Counts occurrences of each distinct value. Entries are ordered by
/// descending count; equal counts keep the order of first appearance.
pub fn frequency_table<'a, I>(values: I) -> Vec<(&'a str, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut entries: Vec<(&'a str, usize)> = Vec::new();
    for value in values {
        match positions.get(value) {
            Some(&idx) => entries[idx].1 += 1,
            None => {
                positions.insert(value, entries.len());
                entries.push((value, 1));
            }
        }
    }
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}
