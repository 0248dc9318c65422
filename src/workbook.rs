//! Spreadsheet snapshots read with calamine

use crate::cell::Cell;
use crate::error::{LandtrackError, Result};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::path::Path;

/// Whether a file is read as a workbook rather than through DuckDB
pub fn is_workbook(file_path: &Path) -> bool {
    file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false)
}

/// Column names and rows of the first worksheet. The first row holds the
/// headers; rows with no values at all are dropped.
pub fn read_workbook(file_path: &Path) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let mut workbook = open_workbook_auto(file_path)
        .map_err(|e| LandtrackError::snapshot_unreadable(file_path, format!("malformed workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LandtrackError::snapshot_unreadable(file_path, "workbook has no worksheets"))?
        .map_err(|e| LandtrackError::snapshot_unreadable(file_path, format!("malformed worksheet: {}", e)))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(LandtrackError::snapshot_unreadable(file_path, "worksheet is empty"));
    };

    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell.to_string().trim() {
            "" => format!("column{}", i),
            name => name.to_string(),
        })
        .collect();

    let rows = rows
        .map(|row| row.iter().map(data_to_cell).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    Ok((columns, rows))
}

/// Spreadsheet dates arrive as datetimes; midnight values become plain dates
fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(_) => match data.as_datetime() {
            Some(dt) => datetime_cell(dt),
            None => Cell::Text(data.to_string()),
        },
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
            .map(datetime_cell)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

fn datetime_cell(dt: NaiveDateTime) -> Cell {
    if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 {
        Cell::Date(dt.date())
    } else {
        Cell::DateTime(dt)
    }
}
