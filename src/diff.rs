//! New-row detection between two snapshots

use crate::cell::Cell;
use crate::error::{LandtrackError, Result};
use crate::inference::{KeyInference, KeySelection, KeyStrategy};
use crate::snapshot::{Record, Snapshot, SnapshotView};
use serde::Serialize;
use std::collections::HashSet;

/// Outcome of aligning two column sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnReconciliation {
    /// Columns present in both snapshots, in the newer snapshot's order
    pub common: Vec<String>,
    /// Columns dropped from the newer snapshot for comparison
    pub only_in_newer: Vec<String>,
    /// Columns dropped from the older snapshot for comparison
    pub only_in_older: Vec<String>,
}

impl ColumnReconciliation {
    pub fn between(newer: &Snapshot, older: &Snapshot) -> Self {
        let mut common = Vec::new();
        let mut only_in_newer = Vec::new();
        for column in newer.columns() {
            if older.has_column(column) {
                common.push(column.clone());
            } else {
                only_in_newer.push(column.clone());
            }
        }

        let only_in_older = older
            .columns()
            .iter()
            .filter(|c| !newer.has_column(c))
            .cloned()
            .collect();

        Self {
            common,
            only_in_newer,
            only_in_older,
        }
    }

    pub fn has_drift(&self) -> bool {
        !self.only_in_newer.is_empty() || !self.only_in_older.is_empty()
    }
}

/// Rows of the newer snapshot whose key is absent from the older snapshot
#[derive(Debug, Clone)]
pub struct DiffResult<'a> {
    pub newer: &'a Snapshot,
    pub older: &'a Snapshot,
    pub keys: KeySelection,
    pub reconciliation: ColumnReconciliation,
    new_rows: Vec<usize>,
}

impl<'a> DiffResult<'a> {
    /// Positions of new rows within the newer snapshot, in original order
    pub fn new_row_indices(&self) -> &[usize] {
        &self.new_rows
    }

    pub fn new_entry_count(&self) -> usize {
        self.new_rows.len()
    }

    pub fn has_new_entries(&self) -> bool {
        !self.new_rows.is_empty()
    }

    /// New rows with every column of the newer snapshot
    pub fn new_rows(&self) -> impl Iterator<Item = &'a [Cell]> + '_ {
        let rows = self.newer.rows();
        self.new_rows.iter().map(move |&i| rows[i].as_slice())
    }

    /// New rows as column-name mappings, ready for downstream consumers
    pub fn new_records(&self) -> Vec<Record> {
        self.new_rows
            .iter()
            .filter_map(|&i| self.newer.record(i))
            .collect()
    }

    /// Human-readable caveats about this comparison
    pub fn diagnostics(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if !self.reconciliation.only_in_newer.is_empty() {
            notes.push(format!(
                "Columns only in newer snapshot: {}",
                self.reconciliation.only_in_newer.join(", ")
            ));
        }
        if !self.reconciliation.only_in_older.is_empty() {
            notes.push(format!(
                "Columns only in older snapshot: {}",
                self.reconciliation.only_in_older.join(", ")
            ));
        }
        match self.keys.strategy {
            KeyStrategy::FullRow => notes.push(
                "No unique identifier columns found; full rows were compared and duplicates may be reported"
                    .to_string(),
            ),
            KeyStrategy::NoCommonColumns => notes.push(
                "Snapshots share no columns; no rows could be matched and none are reported as new"
                    .to_string(),
            ),
            _ => {}
        }
        notes
    }
}

/// Computes new entries between snapshots
#[derive(Debug, Clone, Default)]
pub struct SnapshotDiffer {
    inference: KeyInference,
}

impl SnapshotDiffer {
    pub fn new(inference: KeyInference) -> Self {
        Self { inference }
    }

    /// Diff two snapshots, inferring key columns from the newer one after
    /// restricting both to their common columns.
    pub fn diff<'a>(&self, newer: &'a Snapshot, older: &'a Snapshot) -> DiffResult<'a> {
        let reconciliation = ColumnReconciliation::between(newer, older);
        if reconciliation.has_drift() {
            log::warn!(
                "Column differences detected (newer only: [{}], older only: [{}]); using {} common columns",
                reconciliation.only_in_newer.join(", "),
                reconciliation.only_in_older.join(", "),
                reconciliation.common.len()
            );
        }

        let keys = self.inference.infer_view(&newer.project(&reconciliation.common));
        log::debug!("Key columns: {:?} ({:?})", keys.columns, keys.strategy);

        let new_rows = if keys.columns.is_empty() {
            Vec::new()
        } else {
            find_new_rows(newer, older, &keys.columns)
        };

        DiffResult {
            newer,
            older,
            keys,
            reconciliation,
            new_rows,
        }
    }

    /// Diff two snapshots using a caller-supplied key column set.
    pub fn diff_with_keys<'a, S: AsRef<str>>(
        &self,
        newer: &'a Snapshot,
        older: &'a Snapshot,
        keys: &[S],
    ) -> Result<DiffResult<'a>> {
        if keys.is_empty() {
            return Err(LandtrackError::invalid_input("Key column set must not be empty"));
        }

        for key in keys {
            let key = key.as_ref();
            if !newer.has_column(key) || !older.has_column(key) {
                return Err(LandtrackError::invalid_input(format!(
                    "Key column '{}' is not present in both '{}' and '{}'",
                    key,
                    newer.name(),
                    older.name()
                )));
            }
        }

        let columns: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();
        let new_rows = find_new_rows(newer, older, &columns);

        Ok(DiffResult {
            newer,
            older,
            keys: KeySelection {
                columns,
                strategy: KeyStrategy::Explicit,
            },
            reconciliation: ColumnReconciliation::between(newer, older),
            new_rows,
        })
    }
}

/// Hash the older snapshot's keys once, then scan the newer snapshot in order.
fn find_new_rows(newer: &Snapshot, older: &Snapshot, keys: &[String]) -> Vec<usize> {
    let older_view = older.project(keys);
    let newer_view = newer.project(keys);
    let positions: Vec<usize> = (0..keys.len()).collect();

    let older_keys = key_set(&older_view, &positions);

    (0..newer_view.row_count())
        .filter(|&row| !older_keys.contains(&newer_view.key(row, &positions)))
        .collect()
}

fn key_set<'a>(view: &SnapshotView<'a>, positions: &[usize]) -> HashSet<Vec<&'a Cell>> {
    (0..view.row_count())
        .map(|row| view.key(row, positions))
        .collect()
}

/// Diff with the default key patterns
pub fn diff_snapshots<'a>(newer: &'a Snapshot, older: &'a Snapshot) -> DiffResult<'a> {
    SnapshotDiffer::default().diff(newer, older)
}
