//! Output formatting and persistence for aggregate tables.
//!
//! Supports pretty-printed JSON and CSV append for the CLI shell; the
//! library core itself never writes artifacts to disk.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a serializable table as pretty-printed JSON.
pub fn print_json<T: Serialize>(rows: &[T]) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

/// Column names of a CSV-serializable row type.
///
/// `csv` only learns headers from the first record it serializes, so row
/// types name their columns here for the zero-row case.
pub trait TableColumns {
    const COLUMNS: &'static [&'static str];
}

/// Appends serializable rows to a CSV file.
///
/// Creates the file if it does not already exist, writing the header record
/// ahead of any rows. An empty row slice yields a header-only file.
pub fn append_rows<T: Serialize + TableColumns>(path: &str, rows: &[T]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = rows.len(), "Appending CSV rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(false) // IMPORTANT when appending
        .from_writer(file);

    if !file_exists {
        writer.write_record(T::COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}
