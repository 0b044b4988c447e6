use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use table_profiler::config::ProfileConfig;
use table_profiler::data::TableSnapshot;
use table_profiler::loader::{self, LoadOptions};
use table_profiler::profile;
use tempfile::TempDir;

fn generate_visits(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("visits.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "patient_id,weight,site,visit_date,note").expect("header");
    for i in 0..rows {
        let patient = if i % 97 == 0 { "NA".to_string() } else { format!("P{i:06}") };
        let weight = if i % 41 == 0 {
            "999".to_string()
        } else {
            format!("{}.{}", 50 + i % 60, i % 10)
        };
        let site = match i % 4 {
            0 => "north",
            1 => "south",
            2 => "UNKNOWN",
            _ => "  ",
        };
        let day = (i % 28) + 1;
        writeln!(file, "{patient},{weight},{site},2024-02-{day:02},note {i}").expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_profile(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_visits(50_000);
    let config = ProfileConfig::default()
        .with_numeric_sentinels(vec![999.0])
        .with_string_sentinels(["UNKNOWN"])
        .with_identifier_patterns(["_id$"])
        .expect("identifier pattern");
    let snapshot: TableSnapshot =
        loader::load_table(&csv_path, "visits", &LoadOptions::default()).expect("load table");

    let mut group = c.benchmark_group("profile_table");

    group.bench_function("load_csv", |b| {
        b.iter_batched(
            || (),
            |_| {
                loader::load_table(&csv_path, "visits", &LoadOptions::default())
                    .expect("load table");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("profile_snapshot", |b| {
        b.iter(|| profile::profile(&snapshot, &config).expect("profile"));
    });

    drop(temp_dir);
    group.finish();
}

criterion_group!(benches, bench_profile);
criterion_main!(benches);
