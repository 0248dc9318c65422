//! Persisted summary + detail reports of a comparison

use crate::csv::write_table;
use crate::diff::DiffResult;
use crate::error::{LandtrackError, Result};
use crate::hash::HashValue;
use crate::snapshot::Record;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk layout of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One JSON document holding both sections
    #[default]
    Json,
    /// A summary CSV plus a new-entries CSV
    Csv,
}

impl ReportFormat {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Invalid report format: {}. Use 'json' or 'csv'", s)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// A metric/value pair of the summary section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub metric: String,
    pub value: Value,
}

impl SummaryEntry {
    fn new(metric: &str, value: impl Into<Value>) -> Self {
        Self {
            metric: metric.to_string(),
            value: value.into(),
        }
    }

    /// Value as plain text, without JSON quoting
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Report contents, detached from the snapshots it was built from
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(skip)]
    pub generated_at: NaiveDateTime,
    pub summary: Vec<SummaryEntry>,
    /// Columns of the newer snapshot, the layout of every detail row
    #[serde(skip)]
    pub columns: Vec<String>,
    pub new_entries: Vec<Record>,
}

impl Report {
    pub fn from_diff(diff: &DiffResult<'_>, generated_at: NaiveDateTime) -> Self {
        let reconciliation = &diff.reconciliation;
        let mut summary = vec![
            SummaryEntry::new(
                "Date of comparison",
                generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
            SummaryEntry::new("Newer file", diff.newer.name()),
            SummaryEntry::new("Older file", diff.older.name()),
            SummaryEntry::new("Rows in newer file", diff.newer.row_count()),
            SummaryEntry::new("Rows in older file", diff.older.row_count()),
            SummaryEntry::new("Key columns", diff.keys.columns.join(", ")),
            SummaryEntry::new("Key strategy", serde_json::to_value(diff.keys.strategy).unwrap_or(Value::Null)),
        ];
        if !reconciliation.only_in_newer.is_empty() {
            summary.push(SummaryEntry::new(
                "Columns only in newer file",
                reconciliation.only_in_newer.join(", "),
            ));
        }
        if !reconciliation.only_in_older.is_empty() {
            summary.push(SummaryEntry::new(
                "Columns only in older file",
                reconciliation.only_in_older.join(", "),
            ));
        }
        summary.push(SummaryEntry::new("New entries found", diff.new_entry_count()));

        Self {
            generated_at,
            summary,
            columns: diff.newer.columns().to_vec(),
            new_entries: diff.new_records(),
        }
    }

    /// Record file digests of the compared snapshots
    pub fn with_digests(mut self, newer: &HashValue, older: &HashValue) -> Self {
        self.summary.push(SummaryEntry::new("Newer file digest", newer.as_str()));
        self.summary.push(SummaryEntry::new("Older file digest", older.as_str()));
        self
    }

    pub fn new_entry_count(&self) -> usize {
        self.new_entries.len()
    }

    pub fn metric(&self, name: &str) -> Option<&Value> {
        self.summary.iter().find(|e| e.metric == name).map(|e| &e.value)
    }

    /// `new_entries_report_<YYYYmmdd_HHMMSS>`
    pub fn file_stem(&self) -> String {
        format!("new_entries_report_{}", self.generated_at.format("%Y%m%d_%H%M%S"))
    }

    fn detail_rows(&self) -> Vec<Vec<String>> {
        self.new_entries
            .iter()
            .map(|record| {
                self.columns
                    .iter()
                    .map(|c| record.get(c).map(|cell| cell.to_string()).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

/// Files produced by a report write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub paths: Vec<PathBuf>,
}

/// Writes reports into a directory in a given format
#[derive(Debug, Clone, Copy)]
pub struct ReportWriter {
    format: ReportFormat,
}

impl ReportWriter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Write `report` into `dir`, creating the directory if needed. Zero new
    /// entries is not an error.
    pub fn write(&self, report: &Report, dir: &Path) -> Result<WrittenReport> {
        fs::create_dir_all(dir).map_err(|e| LandtrackError::report(dir, e.to_string()))?;

        let stem = self.unused_stem(report, dir);
        let paths = match self.format {
            ReportFormat::Json => vec![self.write_json(report, dir, &stem)?],
            ReportFormat::Csv => self.write_csv(report, dir, &stem)?,
        };

        for path in &paths {
            log::info!("Report saved to: {}", path.display());
        }
        Ok(WrittenReport { paths })
    }

    /// The report's stem, suffixed `_2`, `_3`, ... while an earlier report
    /// from the same second occupies it
    fn unused_stem(&self, report: &Report, dir: &Path) -> String {
        let taken = |stem: &str| match self.format {
            ReportFormat::Json => dir.join(format!("{}.json", stem)).exists(),
            ReportFormat::Csv => dir.join(format!("{}_summary.csv", stem)).exists(),
        };

        let base = report.file_stem();
        if !taken(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}_{}", base, n))
            .find(|stem| !taken(stem))
            .unwrap_or(base)
    }

    fn write_json(&self, report: &Report, dir: &Path, stem: &str) -> Result<PathBuf> {
        let path = dir.join(format!("{}.json", stem));
        let content = serde_json::to_string_pretty(report)
            .map_err(|e| LandtrackError::report(&path, e.to_string()))?;
        fs::write(&path, content).map_err(|e| LandtrackError::report(&path, e.to_string()))?;
        Ok(path)
    }

    fn write_csv(&self, report: &Report, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        let summary_path = dir.join(format!("{}_summary.csv", stem));
        let summary_rows: Vec<Vec<String>> = report
            .summary
            .iter()
            .map(|e| vec![e.metric.clone(), e.value_text()])
            .collect();
        write_table(&summary_path, &["Metric", "Value"], &summary_rows)
            .map_err(|e| LandtrackError::report(&summary_path, e.to_string()))?;

        let mut paths = vec![summary_path];
        if report.new_entry_count() > 0 {
            let detail_path = dir.join(format!("{}_new_entries.csv", stem));
            write_table(&detail_path, &report.columns, &report.detail_rows())
                .map_err(|e| LandtrackError::report(&detail_path, e.to_string()))?;
            paths.push(detail_path);
        }
        Ok(paths)
    }
}
