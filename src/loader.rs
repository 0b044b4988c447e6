use std::{io::Read, path::Path};

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    data::{Cell, TableSnapshot},
    io_utils,
};

pub const DEFAULT_NA_TOKEN: &str = "NA";

/// How a delimited file is turned into a [`TableSnapshot`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    /// Cells equal to one of these (exactly, before trimming) become
    /// [`Cell::Missing`].
    pub na_tokens: Vec<String>,
    pub limit: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
            na_tokens: vec![DEFAULT_NA_TOKEN.to_string()],
            limit: None,
        }
    }
}

impl LoadOptions {
    fn to_cell(&self, raw: String) -> Cell {
        if self.na_tokens.iter().any(|token| *token == raw) {
            Cell::Missing
        } else {
            Cell::Text(raw)
        }
    }
}

pub fn load_table(path: &Path, table_name: &str, options: &LoadOptions) -> Result<TableSnapshot> {
    let input = io_utils::open_input(path)?;
    read_table(input, table_name, options).with_context(|| format!("Loading table from {path:?}"))
}

/// Parses delimited text from `input`. In a single-column table a blank line
/// is an empty value and becomes an empty text cell.
pub fn read_table<R: Read>(
    mut input: R,
    table_name: &str,
    options: &LoadOptions,
) -> Result<TableSnapshot> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes).context("Reading table input")?;
    let mut reader = io_utils::open_csv_reader(bytes.as_slice(), options.delimiter);
    let headers = io_utils::reader_headers(&mut reader, options.encoding)?;
    let rows = if headers.len() == 1 {
        let header_end = body_start(&bytes, reader.position().byte() as usize);
        let mut patched = bytes[..header_end].to_vec();
        patched.extend(io_utils::quote_blank_lines(&bytes[header_end..]));
        let mut reader = io_utils::open_csv_reader(patched.as_slice(), options.delimiter);
        read_rows(&mut reader, options)?
    } else {
        read_rows(&mut reader, options)?
    };
    debug!(
        "Read {} row(s) across {} column(s) for table '{table_name}'",
        rows.len(),
        headers.len()
    );
    Ok(TableSnapshot::from_rows(table_name, &headers, rows)?)
}

/// Offset of the first byte after the header row and its line terminator.
fn body_start(bytes: &[u8], consumed: usize) -> usize {
    let mut start = consumed.min(bytes.len());
    let prev = start.checked_sub(1).map(|idx| bytes[idx]);
    if prev != Some(b'\n') {
        if prev != Some(b'\r') && bytes.get(start) == Some(&b'\r') {
            start += 1;
        }
        if bytes.get(start) == Some(&b'\n') {
            start += 1;
        }
    }
    start
}

fn read_rows<R: Read>(
    reader: &mut csv::Reader<R>,
    options: &LoadOptions,
) -> Result<Vec<Vec<Cell>>> {
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        if let Some(limit) = options.limit
            && row_idx >= limit
        {
            break;
        }
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, options.encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(
            decoded
                .into_iter()
                .map(|raw| options.to_cell(raw))
                .collect::<Vec<_>>(),
        );
    }
    Ok(rows)
}
