#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use table_profiler::data::{ColumnValues, TableSnapshot};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Builds a snapshot from `(column, values)` pairs; `None` is an explicit
/// missing value.
pub fn snapshot(name: &str, columns: &[(&str, Vec<Option<&str>>)]) -> TableSnapshot {
    let columns = columns
        .iter()
        .map(|(column, values)| ColumnValues::from_options(*column, values.iter().copied()))
        .collect();
    TableSnapshot::new(name, columns).expect("consistent snapshot")
}

/// Ten patients, the fourth of whom has no MRN.
pub const PATIENTS_CSV: &str = "\
mrn,age,site,admitted
P001,34,north,2024-01-03
P002,51,south,2024-01-05
P003,999,north,2024-01-09
NA,47,east,2024-01-10
P005,62,north,2024-01-12
P006,999,south,2024-01-15
P007,38,north,2024-01-18
P008,999,west,2024-01-21
P009,56,north,2024-01-22
P010,41,south,2024-01-30
";

pub const PATIENTS_CONFIG: &str = "\
sentinel_detection:
  numeric_sentinels: [999]
identifier_columns: [mrn]
";
