//! Readers for the tabular sources.
//!
//! Every column is read as a string: coercing values to numbers is left to the normalisers so that
//! an unparsable cell becomes a missing value instead of failing the whole read.

use std::{io::Cursor, path::Path};

use anyhow::{Context, Result};
use log::debug;
use polars::prelude::*;

use crate::error::{EconmapError, EconmapResult};

/// Read CSV bytes with a header row, all columns as `String`
pub fn read_csv_bytes(bytes: Vec<u8>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

/// Read an in-memory CSV document, all columns as `String`
pub fn read_csv_str(contents: &str) -> PolarsResult<DataFrame> {
    read_csv_bytes(contents.as_bytes().to_vec())
}

/// Read a CSV file from `path`, all columns as `String`
pub fn read_csv_path<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read CSV file {}", path.display()))?;
    let df = read_csv_bytes(bytes)
        .with_context(|| format!("Failed to parse CSV file {}", path.display()))?;
    debug!("read {} with shape {:?}", path.display(), df.shape());
    Ok(df)
}

/// Fail fast with a `Schema` error naming the first of `columns` missing from `df`
pub fn require_columns(df: &DataFrame, source_name: &str, columns: &[&str]) -> EconmapResult<()> {
    let present = df.get_column_names();
    match columns.iter().find(|column| !present.contains(*column)) {
        Some(column) => Err(EconmapError::schema(source_name, column)),
        None => Ok(()),
    }
}
