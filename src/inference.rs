//! Heuristic selection of identifier columns for a snapshot

use crate::cell::Cell;
use crate::snapshot::{Snapshot, SnapshotView};
use serde::Serialize;
use std::collections::HashSet;

/// Substrings that suggest a column identifies its row
pub const DEFAULT_KEY_PATTERNS: &[&str] = &[
    "id", "key", "code", "no", "number", "lot", "name", "location",
];

/// How a key column set was arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// One identifier-like column is unique on its own
    SingleCandidate,
    /// Several identifier-like columns are unique together
    CandidateCombination,
    /// Some other column happens to be unique
    SingleColumnFallback,
    /// Nothing is unique; every column forms the key
    FullRow,
    /// The view has no columns to key on
    NoCommonColumns,
    /// Key columns were supplied by the caller
    Explicit,
}

/// Result of key inference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySelection {
    pub columns: Vec<String>,
    pub strategy: KeyStrategy,
}

impl KeySelection {
    /// Comparison falls back to full-row equality and may report duplicates
    pub fn is_degraded(&self) -> bool {
        matches!(self.strategy, KeyStrategy::FullRow | KeyStrategy::NoCommonColumns)
    }
}

/// Key inference with a configurable set of identifier name patterns
#[derive(Debug, Clone)]
pub struct KeyInference {
    patterns: Vec<String>,
}

impl Default for KeyInference {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PATTERNS.iter().copied())
    }
}

impl KeyInference {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether a column name looks like an identifier
    pub fn is_candidate(&self, column: &str) -> bool {
        let lower = column.to_lowercase();
        self.patterns.iter().any(|p| lower.contains(p.as_str()))
    }

    /// Infer key columns over every column of a snapshot
    pub fn infer(&self, snapshot: &Snapshot) -> KeySelection {
        self.infer_view(&snapshot.view())
    }

    /// Infer key columns over the columns visible through a view
    pub fn infer_view(&self, view: &SnapshotView<'_>) -> KeySelection {
        let names = view.column_names();
        if names.is_empty() {
            log::warn!("No columns available to identify rows");
            return KeySelection {
                columns: Vec::new(),
                strategy: KeyStrategy::NoCommonColumns,
            };
        }

        let candidates: Vec<usize> = (0..names.len())
            .filter(|&p| self.is_candidate(names[p]))
            .collect();

        if !candidates.is_empty() {
            if let Some(&p) = candidates.iter().find(|&&p| column_is_unique(view, p)) {
                return selection(&names, &[p], KeyStrategy::SingleCandidate);
            }

            if let Some(combo) = find_unique_combination(view, &names, &candidates) {
                return selection(&names, &combo, KeyStrategy::CandidateCombination);
            }
        }

        if let Some(p) = (0..names.len()).find(|&p| column_is_unique(view, p)) {
            return selection(&names, &[p], KeyStrategy::SingleColumnFallback);
        }

        log::warn!(
            "No unique identifier columns found in '{}'; comparing full rows, duplicates may be reported",
            view.snapshot().name()
        );
        let all: Vec<usize> = (0..names.len()).collect();
        selection(&names, &all, KeyStrategy::FullRow)
    }
}

/// Infer key columns with the default identifier patterns
pub fn infer_key_columns(snapshot: &Snapshot) -> KeySelection {
    KeyInference::default().infer(snapshot)
}

fn selection(names: &[&str], positions: &[usize], strategy: KeyStrategy) -> KeySelection {
    KeySelection {
        columns: positions.iter().map(|&p| names[p].to_string()).collect(),
        strategy,
    }
}

/// A single column is unique when its distinct non-empty values number as
/// many as the rows. Any empty cell therefore disqualifies it.
fn column_is_unique(view: &SnapshotView<'_>, position: usize) -> bool {
    let mut seen: HashSet<&Cell> = HashSet::with_capacity(view.row_count());
    for cell in view.column_values(position) {
        if cell.is_empty() || !seen.insert(cell) {
            return false;
        }
    }
    true
}

/// Composite keys treat empty cells as ordinary values.
fn combination_is_unique(view: &SnapshotView<'_>, positions: &[usize]) -> bool {
    let mut seen: HashSet<Vec<&Cell>> = HashSet::with_capacity(view.row_count());
    (0..view.row_count()).all(|row| seen.insert(view.key(row, positions)))
}

/// Search candidate combinations of size 2..=N, fewest columns first and
/// then in lexical order of column names.
fn find_unique_combination(
    view: &SnapshotView<'_>,
    names: &[&str],
    candidates: &[usize],
) -> Option<Vec<usize>> {
    if candidates.len() < 2 {
        return None;
    }

    // Any unique subset implies the whole candidate set is unique.
    if !combination_is_unique(view, candidates) {
        return None;
    }

    let mut sorted = candidates.to_vec();
    sorted.sort_by(|&a, &b| names[a].cmp(names[b]).then(a.cmp(&b)));

    for size in 2..=sorted.len() {
        let mut found = None;
        for_each_combination(sorted.len(), size, |indices| {
            let combo: Vec<usize> = indices.iter().map(|&i| sorted[i]).collect();
            if combination_is_unique(view, &combo) {
                found = Some(combo);
                true
            } else {
                false
            }
        });
        if found.is_some() {
            return found;
        }
    }

    None
}

/// Visit k-combinations of 0..n in lexicographic order until `visit`
/// returns true.
fn for_each_combination<F>(n: usize, k: usize, mut visit: F)
where
    F: FnMut(&[usize]) -> bool,
{
    if k == 0 || k > n {
        return;
    }

    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        if visit(&indices) {
            return;
        }

        let mut i = k;
        loop {
            if i == 0 {
                return;
            }
            i -= 1;
            if indices[i] != i + n - k {
                break;
            }
            if i == 0 {
                return;
            }
        }
        indices[i] += 1;
        for j in i + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}
