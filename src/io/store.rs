//! The persisted CSV store.
//!
//! `date,series,value` with one row per month per series is the durable
//! contract between the update pipeline and every reader (dashboard, wide
//! export). The store is exclusively owned by the update pipeline, which
//! rewrites it in full on every run; readers never mutate it.
//!
//! Writes go to a sibling `.tmp` file followed by a rename, so an interrupted
//! update never leaves a half-written dataset at the canonical path.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::Observation;
use crate::error::AppError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load the full dataset, treating a missing file as an empty prior dataset.
///
/// An existing-but-unreadable file is an error: merging against a partially
/// read dataset could silently drop history.
pub fn load_if_exists(path: &Path) -> Result<Vec<Observation>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load(path)
}

/// Load the full dataset from `path`. Any malformed row is fatal.
pub fn load(path: &Path) -> Result<Vec<Observation>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open dataset '{}': {e}", path.display()),
        )
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read dataset headers: {e}")))?
        .clone();

    for required in ["date", "series", "value"] {
        if !headers.iter().any(|h| h == required) {
            return Err(AppError::new(
                2,
                format!(
                    "Dataset '{}' is missing required column `{required}`.",
                    path.display()
                ),
            ));
        }
    }
    let col = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
    let (date_col, series_col, value_col) = (col("date"), col("series"), col("value"));

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1, so records start at line 2.
        let line = idx + 2;
        let record =
            result.map_err(|e| AppError::new(2, format!("Dataset line {line}: {e}")))?;

        let field = |i: usize| record.get(i).unwrap_or("");
        let date = NaiveDate::parse_from_str(field(date_col), DATE_FORMAT).map_err(|e| {
            AppError::new(
                2,
                format!("Dataset line {line}: invalid date '{}': {e}", field(date_col)),
            )
        })?;
        let series = field(series_col);
        if series.is_empty() {
            return Err(AppError::new(
                2,
                format!("Dataset line {line}: empty series key."),
            ));
        }
        let value: f64 = field(value_col).parse().map_err(|e| {
            AppError::new(
                2,
                format!(
                    "Dataset line {line}: invalid value '{}': {e}",
                    field(value_col)
                ),
            )
        })?;

        rows.push(Observation::new(date, series, value));
    }

    Ok(rows)
}

/// Rewrite the store in full and return the number of rows written.
///
/// Creates the containing directory if absent. `rows` is expected to already
/// be merged/deduplicated/sorted; this function only serializes.
pub fn write(path: &Path, rows: &[Observation]) -> Result<usize, AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::new(
                    3,
                    format!("Failed to create data dir '{}': {e}", parent.display()),
                )
            })?;
        }
    }

    let tmp = tmp_path(path);
    let mut file = File::create(&tmp).map_err(|e| {
        AppError::new(3, format!("Failed to create '{}': {e}", tmp.display()))
    })?;

    writeln!(file, "date,series,value")
        .map_err(|e| AppError::new(3, format!("Failed to write dataset header: {e}")))?;

    for r in rows {
        // f64 Display is shortest round-trip, so write->read is exact.
        writeln!(file, "{},{},{}", r.date.format(DATE_FORMAT), r.series, r.value)
            .map_err(|e| AppError::new(3, format!("Failed to write dataset row: {e}")))?;
    }

    file.sync_all()
        .map_err(|e| AppError::new(3, format!("Failed to flush dataset: {e}")))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| {
        AppError::new(
            3,
            format!("Failed to move dataset into place at '{}': {e}", path.display()),
        )
    })?;

    Ok(rows.len())
}

fn tmp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
