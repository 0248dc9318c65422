//! Snapshot loading via DuckDB

use crate::cell::Cell;
use crate::error::{LandtrackError, Result};
use crate::snapshot::Snapshot;
use crate::workbook::{is_workbook, read_workbook};
use chrono::{DateTime, NaiveDate};
use duckdb::types::ValueRef;
use duckdb::Connection;
use std::path::Path;

/// Days between 0001-01-01 and 1970-01-01, for DuckDB's epoch-based dates
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Loads tabular files into in-memory snapshots
pub struct DataProcessor {
    connection: Connection,
}

impl DataProcessor {
    pub fn new() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute("SET enable_progress_bar=false", [])?;
        // Row order is significant for new-entry reporting
        connection.execute("SET preserve_insertion_order=true", [])?;
        Ok(Self { connection })
    }

    /// Load a file as a snapshot with the given retrieval date
    pub fn load_snapshot(&self, file_path: &Path, retrieved: Option<NaiveDate>) -> Result<Snapshot> {
        if !file_path.is_file() {
            return Err(LandtrackError::snapshot_unreadable(file_path, "file not found"));
        }
        if std::fs::metadata(file_path)?.len() == 0 {
            return Err(LandtrackError::snapshot_unreadable(file_path, "file is empty"));
        }

        let (columns, rows) = if is_workbook(file_path) {
            read_workbook(file_path)?
        } else {
            self.query_file(file_path)?
        };

        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.display().to_string());

        log::debug!("Loaded {} rows x {} columns from {}", rows.len(), columns.len(), name);

        Snapshot::new(name, retrieved, columns, rows)
            .map_err(|e| LandtrackError::snapshot_unreadable(file_path, e.to_string()))
    }

    fn query_file(&self, file_path: &Path) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
        let source = Self::source_expression(file_path)?;
        self.connection
            .execute(
                &format!("CREATE OR REPLACE VIEW snapshot_view AS SELECT * FROM {}", source),
                [],
            )
            .map_err(|e| Self::convert_duckdb_error(e, file_path))?;

        let columns = self
            .column_names()
            .map_err(|e| Self::convert_duckdb_error(e, file_path))?;
        let rows = self
            .extract_rows(columns.len())
            .map_err(|e| Self::convert_duckdb_error(e, file_path))?;
        Ok((columns, rows))
    }

    /// DuckDB table expression for a file, chosen by extension
    fn source_expression(file_path: &Path) -> Result<String> {
        let path = file_path.to_string_lossy().replace('\'', "''");
        let extension = file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(format!("read_csv('{}', header = true)", path)),
            "tsv" => Ok(format!("read_csv('{}', header = true, delim = '\\t')", path)),
            "parquet" | "json" | "jsonl" => Ok(format!("'{}'", path)),
            other => Err(LandtrackError::snapshot_unreadable(
                file_path,
                format!("unsupported format '{}'", other),
            )),
        }
    }

    fn column_names(&self) -> duckdb::Result<Vec<String>> {
        let mut stmt = self.connection.prepare("DESCRIBE snapshot_view")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        names.collect()
    }

    fn extract_rows(&self, column_count: usize) -> duckdb::Result<Vec<Vec<Cell>>> {
        let mut stmt = self.connection.prepare("SELECT * FROM snapshot_view")?;
        let rows = stmt.query_map([], |row| {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                cells.push(value_to_cell(row.get_ref(i)?));
            }
            Ok(cells)
        })?;
        rows.collect()
    }

    /// Map DuckDB failures onto the snapshot-unreadable error kind
    fn convert_duckdb_error(error: duckdb::Error, file_path: &Path) -> LandtrackError {
        let error_msg = error.to_string();

        let reason = if error_msg.contains("CSV Error")
            || error_msg.contains("Invalid CSV")
            || error_msg.contains("Unterminated quoted field")
        {
            format!("malformed CSV: {}", error_msg)
        } else if error_msg.contains("No files found") || error_msg.contains("does not exist") {
            "file not found".to_string()
        } else if error_msg.contains("Permission denied") {
            "permission denied".to_string()
        } else if error_msg.contains("UTF-8") || error_msg.contains("encoding") {
            format!("encoding error: {}", error_msg)
        } else {
            error_msg
        };

        LandtrackError::snapshot_unreadable(file_path, reason)
    }

    /// Check if file format is supported
    pub fn is_supported_format(file_path: &Path) -> bool {
        if let Some(extension) = file_path.extension().and_then(|s| s.to_str()) {
            matches!(
                extension.to_lowercase().as_str(),
                "csv" | "tsv" | "xlsx" | "parquet" | "json" | "jsonl"
            )
        } else {
            false
        }
    }
}

/// Convert a DuckDB value into a tagged cell
fn value_to_cell(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Empty,
        ValueRef::Boolean(b) => Cell::Text(b.to_string()),
        ValueRef::TinyInt(i) => Cell::Number(i as f64),
        ValueRef::SmallInt(i) => Cell::Number(i as f64),
        ValueRef::Int(i) => Cell::Number(i as f64),
        ValueRef::BigInt(i) => Cell::Number(i as f64),
        ValueRef::HugeInt(i) => Cell::Number(i as f64),
        ValueRef::UTinyInt(i) => Cell::Number(i as f64),
        ValueRef::USmallInt(i) => Cell::Number(i as f64),
        ValueRef::UInt(i) => Cell::Number(i as f64),
        ValueRef::UBigInt(i) => Cell::Number(i as f64),
        ValueRef::Float(f) => Cell::Number(f as f64),
        ValueRef::Double(f) => Cell::Number(f),
        ValueRef::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>().map(Cell::Number).unwrap_or(Cell::Text(text))
        }
        ValueRef::Text(s) => {
            let text = String::from_utf8_lossy(s).to_string();
            if text.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(text)
            }
        }
        ValueRef::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        ValueRef::Timestamp(unit, value) => DateTime::from_timestamp_micros(unit.to_micros(value))
            .map(|dt| Cell::DateTime(dt.naive_utc()))
            .unwrap_or(Cell::Empty),
        ValueRef::Blob(b) => Cell::Text(format!("<blob:{} bytes>", b.len())),
        other => Cell::Text(format!("{:?}", other)),
    }
}
