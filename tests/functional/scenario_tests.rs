//! End-to-end new-entry detection on snapshot files

use crate::common::{assertions, sample_data, TestFixture};
use landtrack::commands::{CompareOptions, CompareOutcome};
use landtrack::data::DataProcessor;
use landtrack::{diff_snapshots, Cell, KeyStrategy};
use std::fs;

fn load(path: &std::path::Path) -> landtrack::Snapshot {
    DataProcessor::new().unwrap().load_snapshot(path, None).unwrap()
}

#[test]
fn test_appended_id_is_the_only_new_entry() {
    let fixture = TestFixture::new().unwrap();
    let older = fixture.create_csv("older.csv", &sample_data::ids(&["1", "2", "3"])).unwrap();
    let newer = fixture.create_csv("newer.csv", &sample_data::ids(&["1", "2", "3", "4"])).unwrap();

    let (older, newer) = (load(&older), load(&newer));
    let diff = diff_snapshots(&newer, &older);

    assert_eq!(diff.keys.columns, vec!["id"]);
    assert_eq!(diff.keys.strategy, KeyStrategy::SingleCandidate);
    assert_eq!(diff.new_row_indices(), &[3]);
    let records = diff.new_records();
    assert_eq!(records[0]["id"], Cell::from(4i64));
}

#[test]
fn test_disjoint_columns_report_nothing() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250401_a.csv", &[vec!["alpha"], vec!["x"], vec!["y"]])
        .unwrap();
    fixture
        .create_snapshot("20250501_b.csv", &[vec!["beta"], vec!["x"], vec!["z"]])
        .unwrap();

    let outcome = fixture.compare(CompareOptions::default()).unwrap();
    match outcome {
        CompareOutcome::Compared {
            key_columns,
            new_entries,
            report,
            ..
        } => {
            assert!(key_columns.is_empty());
            assert_eq!(new_entries, 0);
            assert!(report.is_none());
        }
        other => panic!("Expected comparison, got {:?}", other),
    }

    let older = load(&fixture.workspace.snapshots_dir.join("20250401_a.csv"));
    let newer = load(&fixture.workspace.snapshots_dir.join("20250501_b.csv"));
    let diff = diff_snapshots(&newer, &older);
    assert_eq!(diff.keys.strategy, KeyStrategy::NoCommonColumns);
    assert!(diff
        .diagnostics()
        .iter()
        .any(|d| d.contains("share no columns")));
}

#[test]
fn test_duplicated_new_id_is_reported_twice() {
    let fixture = TestFixture::new().unwrap();
    let older = fixture
        .create_csv(
            "older.csv",
            &[vec!["id", "Tenderer"], vec!["1", "Alpha"], vec!["2", "Beta"]],
        )
        .unwrap();
    let newer = fixture
        .create_csv(
            "newer.csv",
            &[
                vec!["id", "Tenderer"],
                vec!["1", "Alpha"],
                vec!["2", "Beta"],
                vec!["5", "Gamma"],
                vec!["5", "Delta"],
            ],
        )
        .unwrap();

    let (older, newer) = (load(&older), load(&newer));
    let diff = diff_snapshots(&newer, &older);

    assert_eq!(diff.new_entry_count(), 2);
    for record in diff.new_records() {
        assert_eq!(record["id"], Cell::from(5i64));
    }
}

#[test]
fn test_extra_column_is_kept_in_detail_rows() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250401_sites.csv", &[vec!["id", "Location"], vec!["1", "Bedok"]])
        .unwrap();
    fixture
        .create_snapshot(
            "20250501_sites.csv",
            &[
                vec!["id", "Location", "Notes"],
                vec!["1", "Bedok", ""],
                vec!["2", "Tengah", "new launch"],
            ],
        )
        .unwrap();

    let outcome = fixture.compare(CompareOptions::default()).unwrap();
    assert_eq!(assertions::new_entries(&outcome), 1);

    let files = fixture.report_files();
    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&files[0]).unwrap()).unwrap();
    let entry = &report["new_entries"][0];
    assert_eq!(entry["id"], 2);
    assert_eq!(entry["Location"], "Tengah");
    assert_eq!(entry["Notes"], "new launch");

    let summary = report["summary"].as_array().unwrap();
    assert!(summary
        .iter()
        .any(|e| e["metric"] == "Columns only in newer file" && e["value"] == "Notes"));
}

#[test]
fn test_new_entries_keep_file_order() {
    let fixture = TestFixture::new().unwrap();
    let older = fixture
        .create_csv("older.csv", &sample_data::ids(&["10", "20", "30"]))
        .unwrap();
    let newer = fixture
        .create_csv("newer.csv", &sample_data::ids(&["40", "10", "25", "20", "5", "30"]))
        .unwrap();

    let (older, newer) = (load(&older), load(&newer));
    let diff = diff_snapshots(&newer, &older);

    let ids: Vec<Cell> = diff.new_rows().map(|row| row[0].clone()).collect();
    assert_eq!(ids, vec![Cell::from(40i64), Cell::from(25i64), Cell::from(5i64)]);
}

#[test]
fn test_composite_key_when_no_single_column_is_unique() {
    let fixture = TestFixture::new().unwrap();
    let older = fixture
        .create_csv(
            "older.csv",
            &[
                vec!["Lot No", "Location", "Tenderer"],
                vec!["1", "Bedok", "Alpha"],
                vec!["2", "Bedok", "Alpha"],
                vec!["1", "Tengah", "Alpha"],
            ],
        )
        .unwrap();
    let newer = fixture
        .create_csv(
            "newer.csv",
            &[
                vec!["Lot No", "Location", "Tenderer"],
                vec!["1", "Bedok", "Alpha"],
                vec!["2", "Bedok", "Alpha"],
                vec!["1", "Tengah", "Alpha"],
                vec!["2", "Tengah", "Beta"],
            ],
        )
        .unwrap();

    let (older, newer) = (load(&older), load(&newer));
    let diff = diff_snapshots(&newer, &older);

    assert_eq!(diff.keys.strategy, KeyStrategy::CandidateCombination);
    assert_eq!(diff.keys.columns, vec!["Lot No", "Location"]);
    assert_eq!(diff.new_entry_count(), 1);
}

#[test]
fn test_reordered_columns_match_by_name() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot(
            "20250401_sites.csv",
            &[vec!["Location", "Tenderer"], vec!["Bedok", "Alpha"], vec!["Tengah", "Beta"]],
        )
        .unwrap();
    fixture
        .create_snapshot(
            "20250501_sites.csv",
            &[
                vec!["Tenderer", "Location"],
                vec!["Beta", "Tengah"],
                vec!["Alpha", "Bedok"],
            ],
        )
        .unwrap();

    let outcome = fixture.compare(CompareOptions::default()).unwrap();
    assert_eq!(assertions::new_entries(&outcome), 0);
}
