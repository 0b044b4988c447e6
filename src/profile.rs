//! Table-level orchestration of the profiling stages.
//!
//! Each column goes through type inference, sentinel detection, missingness
//! classification, distribution statistics and issue rules, in that order.
//! The per-column results are then folded into one [`TableSummary`].

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    config::ProfileConfig,
    data::{ColumnValues, TableSnapshot, round_to},
    distribution::{self, DistributionResult},
    error::Result,
    issues::{self, Issue, SeverityCounts},
    missingness::{self, Missingness},
    score::{self, QualityScore},
    sentinel::{self, SentinelRecord, SentinelSet},
    types::{self, ColumnType},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub variable_name: String,
    pub inferred_type: ColumnType,
    #[serde(flatten)]
    pub missingness: Missingness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table_name: String,
    pub row_count: usize,
    pub variable_count: usize,
    pub avg_valid_pct: f64,
    pub min_valid_pct: f64,
    pub max_missing_pct: f64,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub info_issues: usize,
    pub quality_score: QualityScore,
    pub worst_variable: Option<String>,
    pub worst_variable_missing_pct: Option<f64>,
}

/// Everything produced for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnResult {
    pub profile: ColumnProfile,
    pub distribution: DistributionResult,
    pub sentinels: Vec<SentinelRecord>,
    pub issues: Vec<Issue>,
}

/// Everything produced for one table snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    pub table_name: String,
    pub profiles: Vec<ColumnProfile>,
    pub distributions: Vec<DistributionResult>,
    pub sentinels: Vec<SentinelRecord>,
    pub issues: Vec<Issue>,
    pub summary: TableSummary,
}

impl TableProfile {
    pub fn distribution(&self, variable_name: &str) -> Option<&DistributionResult> {
        self.distributions
            .iter()
            .find(|result| result.variable_name == variable_name)
    }

    pub fn column(&self, variable_name: &str) -> Option<&ColumnProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.variable_name == variable_name)
    }
}

/// Runs every stage for a single column.
///
/// Fails only when the missingness partition is internally inconsistent.
pub fn profile_column(
    column: &ColumnValues,
    table_name: &str,
    config: &ProfileConfig,
) -> Result<ColumnResult> {
    let name = column.name.as_str();
    let cells = column.cells.as_slice();

    let inferred_type = types::infer(cells, name, config);
    let sentinels = sentinel::detect(cells, name, inferred_type, config);
    let sentinel_set = SentinelSet::from_records(&sentinels);
    let missingness = missingness::classify(cells, &sentinel_set, config.decimal_places());
    missingness.check_invariants(name)?;
    let distribution = distribution::compute(cells, name, inferred_type, &sentinel_set, config);
    let issues = issues::generate(name, table_name, &missingness, inferred_type, config);

    debug!(
        "Column '{name}': type={inferred_type}, sentinels={}, missing={}%, issues={}",
        sentinels.len(),
        missingness.total_missing_pct,
        issues.len()
    );

    Ok(ColumnResult {
        profile: ColumnProfile {
            variable_name: name.to_string(),
            inferred_type,
            missingness,
        },
        distribution,
        sentinels,
        issues,
    })
}

/// Profiles every column of `table` and aggregates the table summary.
pub fn profile(table: &TableSnapshot, config: &ProfileConfig) -> Result<TableProfile> {
    config.validate()?;

    if table.row_count() == 0 {
        info!(
            "Table '{}' has no rows; skipping column profiling",
            table.name
        );
        return Ok(TableProfile {
            table_name: table.name.clone(),
            profiles: Vec::new(),
            distributions: Vec::new(),
            sentinels: Vec::new(),
            issues: Vec::new(),
            summary: empty_summary(table),
        });
    }

    let mut profiles = Vec::with_capacity(table.column_count());
    let mut distributions = Vec::with_capacity(table.column_count());
    let mut sentinels = Vec::new();
    let mut issues = Vec::new();
    for column in table.columns() {
        let result = profile_column(column, &table.name, config)?;
        profiles.push(result.profile);
        distributions.push(result.distribution);
        sentinels.extend(result.sentinels);
        issues.extend(result.issues);
    }

    let summary = summarize(table, &profiles, &issues, config);
    info!(
        "Profiled table '{}': {} row(s), {} column(s), {} issue(s), score {}",
        table.name,
        summary.row_count,
        summary.variable_count,
        issues.len(),
        summary.quality_score
    );

    Ok(TableProfile {
        table_name: table.name.clone(),
        profiles,
        distributions,
        sentinels,
        issues,
        summary,
    })
}

fn empty_summary(table: &TableSnapshot) -> TableSummary {
    TableSummary {
        table_name: table.name.clone(),
        row_count: 0,
        variable_count: table.column_count(),
        avg_valid_pct: 0.0,
        min_valid_pct: 0.0,
        max_missing_pct: 0.0,
        critical_issues: 0,
        warning_issues: 0,
        info_issues: 0,
        quality_score: QualityScore::Excellent,
        worst_variable: None,
        worst_variable_missing_pct: None,
    }
}

fn summarize(
    table: &TableSnapshot,
    profiles: &[ColumnProfile],
    issues: &[Issue],
    config: &ProfileConfig,
) -> TableSummary {
    let places = config.decimal_places();
    let valid_pcts = profiles.iter().map(|profile| profile.missingness.valid_pct);
    let avg_valid_pct = if profiles.is_empty() {
        0.0
    } else {
        valid_pcts.clone().sum::<f64>() / profiles.len() as f64
    };
    let min_valid_pct = valid_pcts.reduce(f64::min).unwrap_or(0.0);

    // Ties keep the earlier column.
    let worst = profiles.iter().fold(None::<&ColumnProfile>, |worst, profile| match worst {
        Some(current)
            if current.missingness.total_missing_pct
                >= profile.missingness.total_missing_pct =>
        {
            Some(current)
        }
        _ => Some(profile),
    });
    let max_missing_pct = worst.map(|profile| profile.missingness.total_missing_pct);

    let counts = SeverityCounts::tally(issues);
    let quality_score = score::score(
        max_missing_pct,
        Some(counts.critical),
        &config.quality_score_thresholds,
    );

    TableSummary {
        table_name: table.name.clone(),
        row_count: table.row_count(),
        variable_count: profiles.len(),
        avg_valid_pct: round_to(avg_valid_pct, places),
        min_valid_pct,
        max_missing_pct: max_missing_pct.unwrap_or(0.0),
        critical_issues: counts.critical,
        warning_issues: counts.warning,
        info_issues: counts.info,
        quality_score,
        worst_variable: worst.map(|profile| profile.variable_name.clone()),
        worst_variable_missing_pct: max_missing_pct,
    }
}
