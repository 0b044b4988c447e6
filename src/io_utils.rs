//! File and stream plumbing for the command layer.
//!
//! Input tables are delimited text decoded through `encoding_rs`; the
//! delimiter follows the file extension unless overridden. A path of `-`
//! means stdin for inputs and stdout for outputs.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const STDIN_TABLE_NAME: &str = "stdin";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Table name implied by an input path: the file stem, or `stdin` for `-`.
pub fn table_name_from_path(path: &Path) -> String {
    if is_dash(path) {
        return STDIN_TABLE_NAME.to_string();
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Rows may be shorter or longer than the header; the loader decides what
/// to do with them.
pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(reader)
}

/// Buffered reader for `path`, or stdin for `-`.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if is_dash(path) {
        Ok(Box::new(std::io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        )))
    }
}

/// Rewrites every blank line before the last record of `body` as `""`.
///
/// An empty value in a single-column file is a blank line, which the csv
/// reader skips. Blank lines inside quoted fields are left alone, and blank
/// lines after the last record are dropped.
pub fn quote_blank_lines(body: &[u8]) -> Vec<u8> {
    let end = body
        .iter()
        .rposition(|byte| !matches!(byte, b'\n' | b'\r'))
        .map_or(0, |idx| idx + 1);
    let mut out = Vec::with_capacity(end + 16);
    let mut in_quotes = false;
    let mut line_start = true;
    for &byte in &body[..end] {
        if line_start && matches!(byte, b'\n' | b'\r') {
            out.extend_from_slice(b"\"\"");
        }
        if byte == b'"' {
            in_quotes = !in_quotes;
        }
        line_start = !in_quotes && byte == b'\n';
        out.push(byte);
    }
    out
}

/// Buffered writer for `path`, or stdout when no path (or `-`) is given.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if !is_dash(p) => Ok(Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        ))),
        _ => Ok(Box::new(std::io::stdout().lock())),
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers().context("Reading header row")?.clone();
    decode_record(&headers, encoding)
}
