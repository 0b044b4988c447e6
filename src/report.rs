//! Rendering of profiling results.
//!
//! Console output is a set of aligned plain-text tables. JSON output is the
//! serialization boundary handed to downstream loaders: it mirrors
//! [`TableProfile`] and adds the top values of each distribution as a
//! `top_values_json` text blob.

use std::{borrow::Cow, fmt::Write as _, io::Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    cli::OutputFormat,
    distribution::{DistributionResult, FrequencyEntry},
    issues::Issue,
    profile::{ColumnProfile, TableProfile, TableSummary},
    sentinel::SentinelRecord,
    types::ColumnType,
};

const NOT_APPLICABLE: &str = "-";

pub fn write_report<W: Write>(
    profile: &TableProfile,
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    let rendered = match format {
        OutputFormat::Table => render_text(profile),
        OutputFormat::Json => {
            let mut json = to_json(profile)?;
            json.push('\n');
            json
        }
    };
    writer
        .write_all(rendered.as_bytes())
        .context("Writing profile report")?;
    writer.flush().context("Flushing profile report")
}

#[derive(Debug, Serialize)]
struct DistributionRecord<'a> {
    table_name: &'a str,
    #[serde(flatten)]
    result: &'a DistributionResult,
    top_values_json: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProfileReport<'a> {
    table_name: &'a str,
    profiles: &'a [ColumnProfile],
    distributions: Vec<DistributionRecord<'a>>,
    sentinels: &'a [SentinelRecord],
    issues: &'a [Issue],
    summary: &'a TableSummary,
}

pub fn to_json(profile: &TableProfile) -> Result<String> {
    let distributions = profile
        .distributions
        .iter()
        .map(|result| -> Result<DistributionRecord<'_>> {
            let blob = result
                .top_values
                .as_deref()
                .map(top_values_json)
                .transpose()?;
            Ok(DistributionRecord {
                table_name: &profile.table_name,
                result,
                top_values_json: blob,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let report = ProfileReport {
        table_name: &profile.table_name,
        profiles: &profile.profiles,
        distributions,
        sentinels: &profile.sentinels,
        issues: &profile.issues,
        summary: &profile.summary,
    };
    serde_json::to_string_pretty(&report).context("Serializing profile report")
}

/// Encodes a frequency list as a compact JSON array of `{value,count,pct}`.
pub fn top_values_json(entries: &[FrequencyEntry]) -> Result<String> {
    serde_json::to_string(entries).context("Serializing top values")
}

pub fn render_text(profile: &TableProfile) -> String {
    let summary = &profile.summary;
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Table '{}': {} row(s), {} variable(s)",
        profile.table_name, summary.row_count, summary.variable_count
    );
    if profile.profiles.is_empty() {
        let _ = writeln!(output);
        output.push_str(&render_summary(summary));
        return output;
    }

    section(&mut output, "Columns", &column_headers(), &column_rows(&profile.profiles));
    section(
        &mut output,
        "Distributions",
        &distribution_headers(),
        &distribution_rows(&profile.distributions),
    );
    if !profile.sentinels.is_empty() {
        section(
            &mut output,
            "Sentinels",
            &to_headers(&["variable", "value", "count", "pct", "method", "confidence"]),
            &sentinel_rows(&profile.sentinels),
        );
    }
    if !profile.issues.is_empty() {
        section(
            &mut output,
            "Issues",
            &to_headers(&["severity", "variable", "issue", "value", "description"]),
            &issue_rows(&profile.issues),
        );
    }
    let _ = writeln!(output);
    output.push_str(&render_summary(summary));
    output
}

/// One row per column: the name and its inferred type.
pub fn render_types(columns: &[(String, ColumnType)]) -> String {
    let rows = columns
        .iter()
        .map(|(name, column_type)| vec![name.clone(), column_type.to_string()])
        .collect::<Vec<_>>();
    render_table(&to_headers(&["variable", "inferred_type"]), &rows)
}

fn section(output: &mut String, title: &str, headers: &[String], rows: &[Vec<String>]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "{title}");
    output.push_str(&render_table(headers, rows));
}

fn to_headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn column_headers() -> Vec<String> {
    to_headers(&[
        "variable",
        "type",
        "total",
        "valid",
        "na",
        "empty",
        "whitespace",
        "sentinel",
        "missing_pct",
        "unique",
        "unique_pct",
    ])
}

fn column_rows(profiles: &[ColumnProfile]) -> Vec<Vec<String>> {
    profiles
        .iter()
        .map(|profile| {
            let m = &profile.missingness;
            vec![
                profile.variable_name.clone(),
                profile.inferred_type.to_string(),
                m.total_count.to_string(),
                m.valid_count.to_string(),
                m.na_count.to_string(),
                m.empty_count.to_string(),
                m.whitespace_count.to_string(),
                m.sentinel_count.to_string(),
                m.total_missing_pct.to_string(),
                m.unique_count.to_string(),
                m.unique_pct.to_string(),
            ]
        })
        .collect()
}

fn distribution_headers() -> Vec<String> {
    to_headers(&[
        "variable", "n", "min", "q25", "median", "mean", "q75", "max", "sd", "mode",
    ])
}

fn distribution_rows(distributions: &[DistributionResult]) -> Vec<Vec<String>> {
    distributions
        .iter()
        .map(|result| {
            let mode = result.mode.as_ref().map_or_else(
                || NOT_APPLICABLE.to_string(),
                |entry| format!("{} ({}, {}%)", entry.value, entry.count, entry.pct),
            );
            let mut row = vec![result.variable_name.clone(), result.n.to_string()];
            match &result.numeric {
                Some(summary) => row.extend([
                    summary.min.to_string(),
                    summary.q25.to_string(),
                    summary.median.to_string(),
                    summary.mean.to_string(),
                    summary.q75.to_string(),
                    summary.max.to_string(),
                    summary
                        .sd
                        .map_or_else(|| NOT_APPLICABLE.to_string(), |sd| sd.to_string()),
                ]),
                None => row.extend(std::iter::repeat_n(NOT_APPLICABLE.to_string(), 7)),
            }
            row.push(mode);
            row
        })
        .collect()
}

fn sentinel_rows(sentinels: &[SentinelRecord]) -> Vec<Vec<String>> {
    sentinels
        .iter()
        .map(|record| {
            vec![
                record.variable_name.clone(),
                record.sentinel_value.clone(),
                record.count.to_string(),
                record.sentinel_pct.to_string(),
                record.detection_method.to_string(),
                record.confidence.to_string(),
            ]
        })
        .collect()
}

fn issue_rows(issues: &[Issue]) -> Vec<Vec<String>> {
    issues
        .iter()
        .map(|issue| {
            vec![
                issue.severity.to_string(),
                issue.variable_name.clone(),
                issue.issue_type.to_string(),
                issue.value.to_string(),
                issue.description.clone(),
            ]
        })
        .collect()
}

fn render_summary(summary: &TableSummary) -> String {
    let worst = match (&summary.worst_variable, summary.worst_variable_missing_pct) {
        (Some(name), Some(pct)) => format!("{name} ({pct}% missing)"),
        _ => NOT_APPLICABLE.to_string(),
    };
    let rows = vec![
        vec!["quality_score".to_string(), summary.quality_score.to_string()],
        vec!["avg_valid_pct".to_string(), summary.avg_valid_pct.to_string()],
        vec!["min_valid_pct".to_string(), summary.min_valid_pct.to_string()],
        vec!["max_missing_pct".to_string(), summary.max_missing_pct.to_string()],
        vec!["worst_variable".to_string(), worst],
        vec![
            "issues".to_string(),
            format!(
                "{} critical, {} warning, {} info",
                summary.critical_issues, summary.warning_issues, summary.info_issues
            ),
        ],
    ];
    render_table(&to_headers(&["summary", "value"]), &rows)
}

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| header.chars().count().max(3))
        .collect();
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(sanitize(value).chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let mut output = String::new();
    for line in std::iter::once(headers).chain(std::iter::once(rule.as_slice())) {
        let _ = writeln!(output, "{}", format_row(line, &widths));
    }
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{:<width$}", sanitize(value), width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

/// Control characters would break the alignment; raw cells may contain them.
fn sanitize(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ProfileConfig,
        data::{ColumnValues, TableSnapshot},
        profile::profile,
    };

    fn sample_profile() -> TableProfile {
        let snapshot = TableSnapshot::new(
            "visits",
            vec![
                ColumnValues::from_options(
                    "site",
                    [Some("north"), Some("south"), Some("north"), None],
                ),
                ColumnValues::from_options(
                    "dose",
                    [Some("1.5"), Some("2.5"), Some("999"), Some("3")],
                ),
            ],
        )
        .unwrap();
        let config = ProfileConfig::default().with_numeric_sentinels(vec![999.0]);
        profile(&snapshot, &config).unwrap()
    }

    #[test]
    fn render_table_aligns_columns() {
        let rendered = render_table(
            &to_headers(&["name", "n"]),
            &[
                vec!["a".to_string(), "10".to_string()],
                vec!["longer\tname".to_string(), "2".to_string()],
            ],
        );
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "name         n");
        assert_eq!(lines[1], "-----------  ---");
        assert_eq!(lines[2], "a            10");
        assert_eq!(lines[3], "longer name  2");
    }

    #[test]
    fn text_report_lists_every_section() {
        let rendered = render_text(&sample_profile());
        assert!(rendered.contains("Table 'visits': 4 row(s), 2 variable(s)"));
        assert!(rendered.contains("Columns"));
        assert!(rendered.contains("Distributions"));
        assert!(rendered.contains("Sentinels"));
        assert!(rendered.contains("config_list"));
        assert!(rendered.contains("Issues"));
        assert!(rendered.contains("high_missingness"));
        assert!(rendered.contains("quality_score"));
        assert!(rendered.contains("Needs Review"));
    }

    #[test]
    fn json_report_adds_top_values_blob() {
        let json = to_json(&sample_profile()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let site = &value["distributions"][0];
        assert_eq!(site["variable_name"], "site");
        assert_eq!(site["table_name"], "visits");
        assert_eq!(site["distribution_type"], "categorical");
        let blob: serde_json::Value =
            serde_json::from_str(site["top_values_json"].as_str().unwrap()).unwrap();
        assert_eq!(blob[0]["value"], "north");
        assert_eq!(blob[0]["count"], 2);

        let dose = &value["distributions"][1];
        assert!(dose["top_values_json"].is_null());
        assert_eq!(dose["numeric"]["max"], 3.0);
        assert_eq!(value["profiles"][1]["sentinel_count"], 1);
        assert_eq!(value["summary"]["quality_score"], "Needs Review");
    }

    #[test]
    fn empty_table_report_has_summary_only() {
        let snapshot =
            TableSnapshot::new("empty", vec![ColumnValues::new("a", Vec::new())]).unwrap();
        let result = profile(&snapshot, &ProfileConfig::default()).unwrap();
        let rendered = render_text(&result);
        assert!(!rendered.contains("Columns"));
        assert!(rendered.contains("Excellent"));
    }
}
