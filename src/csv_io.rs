//! CSV input and output.
//!
//! Input is any CSV with a header row; the URLs come from one named column.
//! Output is one row per scraped course with a header taken from the record
//! type's field names.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::info;

use crate::types::InputRow;

/// How `save_courses` opens an existing output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

/// Read every row of `path` and return `(position, value)` for `column`.
///
/// Fails when the file is missing or has no such column.
pub fn extract_col<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<InputRow>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open input file {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?;
    let col = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in {}", column, path.display()))?;

    reader
        .records()
        .enumerate()
        .map(|(index, record)| {
            let record =
                record.with_context(|| format!("Bad CSV row {} in {}", index, path.display()))?;
            Ok(InputRow::new(index, record.get(col).unwrap_or_default()))
        })
        .collect()
}

/// Write `records` to `path` with a header row.
///
/// An empty slice is logged and nothing is written. The header is written on
/// every call, append mode included, so appending to an existing file leaves
/// a second header line in the middle of it.
pub fn save_courses<T: Serialize, P: AsRef<Path>>(
    records: &[T],
    path: P,
    mode: WriteMode,
) -> Result<()> {
    let path = path.as_ref();
    if records.is_empty() {
        info!("Courses is empty, nothing written to {}", path.display());
        return Ok(());
    }

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(mode == WriteMode::Append)
        .truncate(mode == WriteMode::Overwrite)
        .open(path)
        .with_context(|| format!("Failed to open output file {}", path.display()))?;

    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Wrote {} courses to {}", records.len(), path.display());
    Ok(())
}
