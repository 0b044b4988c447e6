mod common;

use std::fs;

use assert_cmd::Command;
use common::{PATIENTS_CONFIG, PATIENTS_CSV, TestWorkspace};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

fn profiler() -> Command {
    Command::cargo_bin("table-profiler").expect("binary exists")
}

#[test]
fn profile_prints_text_report() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("patients.csv", PATIENTS_CSV);
    let config = workspace.write("profile.yml", PATIENTS_CONFIG);

    profiler()
        .args([
            "profile",
            "-i",
            csv.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Table 'patients': 10 row(s), 4 variable(s)"))
        .stdout(contains("identifier_missing"))
        .stdout(contains("config_list"))
        .stdout(contains("Needs Review"));
}

#[test]
fn profile_writes_json_with_table_override() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("patients.csv", PATIENTS_CSV);
    let config = workspace.write("profile.yml", PATIENTS_CONFIG);
    let output = workspace.path().join("profile.json");

    profiler()
        .args([
            "profile",
            "-i",
            csv.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "--table",
            "admissions",
            "--format",
            "json",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read json report");
    let report: serde_json::Value = serde_json::from_str(&contents).expect("parse json report");
    assert_eq!(report["table_name"], "admissions");
    assert_eq!(report["summary"]["row_count"], 10);
    assert_eq!(report["summary"]["worst_variable"], "age");
    assert_eq!(report["summary"]["critical_issues"], 1);
    assert_eq!(report["issues"][0]["table_name"], "admissions");
    assert_eq!(report["sentinels"][0]["sentinel_value"], "999");
    assert!(report["distributions"][2]["top_values_json"].is_string());
}

#[test]
fn profile_reads_tsv_from_stdin() {
    profiler()
        .args(["profile", "-i", "-", "--delimiter", "tab", "--format", "json"])
        .write_stdin("code\tlabel\n1\ta\n2\t.\n3\tb\n")
        .assert()
        .success()
        .stdout(contains("\"table_name\": \"stdin\""))
        .stdout(contains("\"quality_score\": \"Excellent\""));
}

#[test]
fn custom_na_tokens_mark_missing_values() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("codes.csv", "code,label\n1,a\n2,.\n3,b\n4,c\n");

    profiler()
        .args([
            "profile",
            "-i",
            csv.to_str().unwrap(),
            "--na-token",
            ".",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(contains("\"na_count\": 1"))
        .stdout(contains("high_missingness"));
}

#[test]
fn blank_lines_in_single_column_file_count_as_empty() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("codes.csv", "code\nA\n\nB\n\"\"\nC\n");

    profiler()
        .args(["profile", "-i", csv.to_str().unwrap(), "--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"row_count\": 5"))
        .stdout(contains("\"empty_count\": 2"));
}

#[test]
fn header_only_file_is_excellent() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("empty.csv", "a,b\n");

    profiler()
        .args(["profile", "-i", csv.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("0 row(s)"))
        .stdout(contains("Excellent"))
        .stdout(contains("Columns").not());
}

#[test]
fn infer_lists_column_types() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("patients.csv", PATIENTS_CSV);
    let config = workspace.write("profile.yml", PATIENTS_CONFIG);

    profiler()
        .args([
            "infer",
            "-i",
            csv.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("inferred_type"))
        .stdout(contains("identifier"))
        .stdout(contains("numeric"))
        .stdout(contains("date"))
        .stdout(contains("categorical"));
}

#[test]
fn config_prints_resolved_defaults() {
    profiler()
        .arg("config")
        .assert()
        .success()
        .stdout(contains("min_frequency_pct: 1.0"))
        .stdout(contains("max_unique_for_detection: 50"))
        .stdout(contains("top_n_categories: 15"));
}

#[test]
fn invalid_configuration_fails_with_message() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("data.csv", "a\n1\n");
    let config = workspace.write(
        "bad.yml",
        "missingness_thresholds:\n  high: 5\n  moderate: 10\n",
    );

    profiler()
        .args([
            "profile",
            "-i",
            csv.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("error:"))
        .stderr(contains("missingness_thresholds.moderate"));
}

#[test]
fn rows_longer_than_header_are_rejected() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("ragged.csv", "a,b\n1,2,3\n");

    profiler()
        .args(["profile", "-i", csv.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("header defines 2"));
}

#[test]
fn missing_input_file_reports_path() {
    profiler()
        .args(["profile", "-i", "does-not-exist.csv"])
        .assert()
        .failure()
        .stderr(contains("does-not-exist.csv"));
}
