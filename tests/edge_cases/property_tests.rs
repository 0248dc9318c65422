//! Property tests for key inference and the differ

use landtrack::diff::SnapshotDiffer;
use landtrack::{diff_snapshots, infer_key_columns, Cell, KeyStrategy, Snapshot};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;

const COLUMNS: &[&str] = &["Lot No", "Location", "Tenderer"];

fn snapshot(name: &str, rows: Vec<Vec<Cell>>) -> Snapshot {
    Snapshot::new(name, None, COLUMNS.iter().map(|c| c.to_string()).collect(), rows).unwrap()
}

/// Small value domains so duplicates and collisions are common
fn cell() -> impl Strategy<Value = Cell> {
    prop_oneof![
        Just(Cell::Empty),
        (0i64..4).prop_map(Cell::from),
        prop::sample::select(vec!["Bedok", "Tengah", "Alpha"]).prop_map(Cell::text),
    ]
}

fn table_rows(max: usize) -> impl Strategy<Value = Vec<Vec<Cell>>> {
    vec(vec(cell(), COLUMNS.len()), 0..max)
}

proptest! {
    #[test]
    fn prop_snapshot_against_itself_has_nothing_new(rows in table_rows(12)) {
        let s = snapshot("same", rows);
        prop_assert_eq!(diff_snapshots(&s, &s).new_entry_count(), 0);
    }

    #[test]
    fn prop_explicit_keys_against_itself_have_nothing_new(
        rows in table_rows(12),
        keys in prop::sample::subsequence(COLUMNS.to_vec(), 1..=COLUMNS.len()),
    ) {
        let s = snapshot("same", rows);
        let diff = SnapshotDiffer::default().diff_with_keys(&s, &s, keys.as_slice()).unwrap();
        prop_assert_eq!(diff.new_entry_count(), 0);
        prop_assert_eq!(diff.keys.strategy, KeyStrategy::Explicit);
    }

    #[test]
    fn prop_new_rows_keep_newer_order(older in table_rows(8), newer in table_rows(12)) {
        let older = snapshot("older", older);
        let newer = snapshot("newer", newer);
        let diff = diff_snapshots(&newer, &older);

        let indices = diff.new_row_indices();
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(indices.iter().all(|&i| i < newer.row_count()));
    }

    #[test]
    fn prop_appended_unique_ids_are_exactly_the_new_rows(
        kept in btree_set(0i64..500, 0..10),
        added in btree_set(500i64..1000, 0..10),
    ) {
        let row = |id: i64| vec![Cell::from(id), Cell::text("Bedok"), Cell::Empty];
        let older = snapshot("older", kept.iter().map(|&id| row(id)).collect());
        let mut newer_rows: Vec<Vec<Cell>> = kept.iter().map(|&id| row(id)).collect();
        newer_rows.extend(added.iter().map(|&id| row(id)));
        let newer = snapshot("newer", newer_rows);

        let diff = diff_snapshots(&newer, &older);
        let expected: Vec<usize> = (kept.len()..kept.len() + added.len()).collect();
        prop_assert_eq!(diff.new_row_indices(), expected.as_slice());
    }

    #[test]
    fn prop_unique_candidate_column_is_preferred(ids in btree_set(0i64..1000, 1..15)) {
        let rows = ids
            .iter()
            .map(|&id| vec![Cell::from(id), Cell::text("Bedok"), Cell::text("Alpha")])
            .collect();
        let keys = infer_key_columns(&snapshot("s", rows));

        prop_assert_eq!(keys.strategy, KeyStrategy::SingleCandidate);
        prop_assert_eq!(keys.columns, vec!["Lot No".to_string()]);
    }

    #[test]
    fn prop_inference_always_selects_existing_columns(rows in table_rows(12)) {
        let s = snapshot("s", rows);
        let keys = infer_key_columns(&s);
        prop_assert!(!keys.columns.is_empty());
        prop_assert!(keys.columns.iter().all(|c| s.has_column(c)));
    }
}

#[test]
fn test_empty_snapshots() {
    let empty = snapshot("empty", Vec::new());
    let keys = infer_key_columns(&empty);
    assert!(!keys.columns.is_empty());

    let diff = diff_snapshots(&empty, &empty);
    assert_eq!(diff.new_entry_count(), 0);
    assert!(!diff.has_new_entries());
}
