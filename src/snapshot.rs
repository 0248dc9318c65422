//! In-memory tabular snapshots and column-restricted views over them

use crate::cell::Cell;
use crate::error::{LandtrackError, Result};
use chrono::NaiveDate;
use indexmap::IndexMap;

/// A single row handed to downstream consumers, keyed by column name
pub type Record = IndexMap<String, Cell>;

/// One retrieved tabular dataset at a point in time
#[derive(Debug, Clone)]
pub struct Snapshot {
    name: String,
    retrieved: Option<NaiveDate>,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Snapshot {
    /// Build a snapshot, checking that the column set is non-empty and
    /// every row has one cell per column.
    pub fn new(
        name: impl Into<String>,
        retrieved: Option<NaiveDate>,
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self> {
        let name = name.into();
        if columns.is_empty() {
            return Err(LandtrackError::invalid_input(format!(
                "Snapshot '{}' has no columns",
                name
            )));
        }

        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(LandtrackError::invalid_input(format!(
                "Snapshot '{}' row {} has {} cells, expected {}",
                name,
                index,
                row.len(),
                columns.len()
            )));
        }

        Ok(Self {
            name,
            retrieved,
            columns,
            rows,
        })
    }

    /// Source identity (usually the file name)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retrieved(&self) -> Option<NaiveDate> {
        self.retrieved
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at (row, column name)
    pub fn value(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Row as a column-name to value mapping, preserving column order
    pub fn record(&self, row: usize) -> Option<Record> {
        let cells = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(cells.iter().cloned())
                .collect(),
        )
    }

    /// View over every column
    pub fn view(&self) -> SnapshotView<'_> {
        SnapshotView {
            snapshot: self,
            columns: (0..self.columns.len()).collect(),
        }
    }

    /// View restricted to the named columns, in the order given.
    ///
    /// Names that do not exist in this snapshot are ignored.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> SnapshotView<'_> {
        SnapshotView {
            snapshot: self,
            columns: names
                .iter()
                .filter_map(|n| self.column_index(n.as_ref()))
                .collect(),
        }
    }
}

/// Borrowed, column-restricted window onto a snapshot.
///
/// Rows are never copied; the view only remembers which column positions it
/// exposes.
#[derive(Debug, Clone)]
pub struct SnapshotView<'a> {
    snapshot: &'a Snapshot,
    columns: Vec<usize>,
}

impl<'a> SnapshotView<'a> {
    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    pub fn row_count(&self) -> usize {
        self.snapshot.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names visible through this view
    pub fn column_names(&self) -> Vec<&'a str> {
        self.columns
            .iter()
            .map(|&i| self.snapshot.columns[i].as_str())
            .collect()
    }

    /// Position (within the view) of a column name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|&i| self.snapshot.columns[i] == name)
    }

    /// Cells of one view column, top to bottom
    pub fn column_values(&self, position: usize) -> impl Iterator<Item = &'a Cell> + 'a {
        let col = self.columns[position];
        self.snapshot.rows.iter().map(move |row| &row[col])
    }

    /// Composite key of a row over the given view positions
    pub fn key(&self, row: usize, positions: &[usize]) -> Vec<&'a Cell> {
        let cells = &self.snapshot.rows[row];
        positions.iter().map(|&p| &cells[self.columns[p]]).collect()
    }
}
