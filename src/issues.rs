//! Rule-based quality issues for a single column.
//!
//! Rules are independent; any number of them may fire for the same column.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{config::ProfileConfig, data::round_to, missingness::Missingness, types::ColumnType};

const HIGH_CARDINALITY_RATIO: f64 = 0.90;
const HIGH_CARDINALITY_MIN_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    IdentifierMissing,
    HighMissingness,
    ModerateMissingness,
    ConstantValue,
    HighCardinality,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::IdentifierMissing => "identifier_missing",
            IssueType::HighMissingness => "high_missingness",
            IssueType::ModerateMissingness => "moderate_missingness",
            IssueType::ConstantValue => "constant_value",
            IssueType::HighCardinality => "high_cardinality",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            IssueType::IdentifierMissing => Severity::Critical,
            IssueType::HighMissingness => Severity::Warning,
            IssueType::ModerateMissingness
            | IssueType::ConstantValue
            | IssueType::HighCardinality => Severity::Info,
        }
    }

    fn recommendation(&self) -> &'static str {
        match self {
            IssueType::IdentifierMissing => {
                "Identifiers must be complete. Trace the affected records back to the source extract before loading."
            }
            IssueType::HighMissingness => {
                "Review source data collection for this variable; consider excluding or imputing it before analysis."
            }
            IssueType::ModerateMissingness => {
                "Document the missingness pattern and check whether values are missing at random."
            }
            IssueType::ConstantValue => {
                "Confirm the variable is expected to be constant; it carries no information for analysis."
            }
            IssueType::HighCardinality => {
                "Check whether this is free text or an undeclared identifier; add it to identifier_columns if so."
            }
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub variable_name: String,
    pub table_name: String,
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    /// The measurement that triggered the rule.
    pub value: f64,
    pub recommendation: String,
}

impl Issue {
    fn new(
        issue_type: IssueType,
        variable_name: &str,
        table_name: &str,
        description: String,
        value: f64,
    ) -> Self {
        Self {
            variable_name: variable_name.to_string(),
            table_name: table_name.to_string(),
            issue_type,
            severity: issue_type.severity(),
            description,
            value,
            recommendation: issue_type.recommendation().to_string(),
        }
    }
}

/// Evaluates every rule against one column's classification results.
pub fn generate(
    variable_name: &str,
    table_name: &str,
    missingness: &Missingness,
    column_type: ColumnType,
    config: &ProfileConfig,
) -> Vec<Issue> {
    let thresholds = &config.missingness_thresholds;
    let missing_pct = missingness.total_missing_pct;
    let unique_count = missingness.unique_count;
    let total_count = missingness.total_count;
    let is_identifier = column_type == ColumnType::Identifier;
    let mut issues = Vec::new();

    if is_identifier && missing_pct > thresholds.critical {
        issues.push(Issue::new(
            IssueType::IdentifierMissing,
            variable_name,
            table_name,
            format!("Identifier variable '{variable_name}' has {missing_pct}% missing values"),
            missing_pct,
        ));
    }

    if !is_identifier && missing_pct > thresholds.high {
        issues.push(Issue::new(
            IssueType::HighMissingness,
            variable_name,
            table_name,
            format!("Variable '{variable_name}' has high missingness ({missing_pct}%)"),
            missing_pct,
        ));
    }

    if !is_identifier && missing_pct > thresholds.moderate && missing_pct <= thresholds.high {
        issues.push(Issue::new(
            IssueType::ModerateMissingness,
            variable_name,
            table_name,
            format!("Variable '{variable_name}' has moderate missingness ({missing_pct}%)"),
            missing_pct,
        ));
    }

    if unique_count == 1 && total_count > 0 {
        issues.push(Issue::new(
            IssueType::ConstantValue,
            variable_name,
            table_name,
            format!("Variable '{variable_name}' has a single distinct value"),
            unique_count as f64,
        ));
    }

    if !is_identifier && total_count > HIGH_CARDINALITY_MIN_ROWS && unique_count > 0 {
        let ratio = unique_count as f64 / total_count as f64;
        if ratio > HIGH_CARDINALITY_RATIO {
            let unique_share = round_to(ratio * 100.0, config.decimal_places());
            issues.push(Issue::new(
                IssueType::HighCardinality,
                variable_name,
                table_name,
                format!(
                    "Variable '{variable_name}' has high cardinality ({unique_count} distinct of {total_count} rows, {unique_share}%)"
                ),
                unique_share,
            ));
        }
    }

    issues
}

/// Issue counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn tally<'a, I>(issues: I) -> Self
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        issues
            .into_iter()
            .fold(Self::default(), |mut counts, issue| {
                match issue.severity {
                    Severity::Critical => counts.critical += 1,
                    Severity::Warning => counts.warning += 1,
                    Severity::Info => counts.info += 1,
                }
                counts
            })
    }
}
