//! Integration tests for the compare workflow: store, differ, report

use crate::common::{assertions, sample_data, CliTestRunner, TestFixture};
use landtrack::commands::{CompareOptions, CompareOutcome};
use landtrack::report::ReportFormat;
use landtrack::store::{DirectorySnapshotStore, SnapshotStore};
use landtrack::LandtrackError;
use std::fs;

#[test]
fn test_first_run_has_nothing_to_compare() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250501_sites.csv", &sample_data::register_older())
        .unwrap();

    let outcome = fixture.compare(CompareOptions::default()).unwrap();
    match outcome {
        CompareOutcome::FirstRun { current } => assert_eq!(current.name, "20250501_sites.csv"),
        other => panic!("Expected first run, got {:?}", other),
    }
    assert!(fixture.report_files().is_empty());
}

#[test]
fn test_empty_store_is_an_error() {
    let fixture = TestFixture::new().unwrap();
    let err = fixture.compare(CompareOptions::default()).unwrap_err();
    assert!(matches!(err, LandtrackError::InvalidInput { .. }));
}

#[test]
fn test_latest_is_compared_with_its_predecessor() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250301_sites.csv", &sample_data::ids(&["1"]))
        .unwrap();
    fixture
        .create_snapshot("20250401_sites.csv", &sample_data::register_older())
        .unwrap();
    fixture
        .create_snapshot("20250501_sites.csv", &sample_data::register_newer())
        .unwrap();

    let outcome = fixture.compare(CompareOptions::default()).unwrap();
    match &outcome {
        CompareOutcome::Compared {
            newer,
            older,
            key_columns,
            new_entries,
            report,
            submission,
        } => {
            assert_eq!(newer.name, "20250501_sites.csv");
            assert_eq!(older.name, "20250401_sites.csv");
            assert_eq!(key_columns, &vec!["Location".to_string()]);
            assert_eq!(*new_entries, 2);
            assert!(report.is_some());
            assert!(submission.is_none());
        }
        other => panic!("Expected comparison, got {:?}", other),
    }
}

#[test]
fn test_relative_newer_path_is_compared_with_its_predecessor() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_snapshot("20240101_s.csv", &sample_data::ids(&["1"])).unwrap();
    fixture.create_snapshot("20240102_s.csv", &sample_data::ids(&["1", "2"])).unwrap();
    fixture
        .create_snapshot("20240103_s.csv", &sample_data::ids(&["1", "2", "3"]))
        .unwrap();
    fs::create_dir_all(fixture.root().join("sub")).unwrap();

    for reference in [
        ".landtrack/snapshots/20240102_s.csv",
        "sub/../.landtrack/snapshots/20240102_s.csv",
    ] {
        let outcome = fixture
            .compare(CompareOptions {
                newer: Some(reference.to_string()),
                ..CompareOptions::default()
            })
            .unwrap();
        match outcome {
            CompareOutcome::Compared { newer, older, new_entries, .. } => {
                assert_eq!(newer.name, "20240102_s.csv");
                assert_eq!(older.name, "20240101_s.csv", "older for {}", reference);
                assert_eq!(new_entries, 1);
            }
            other => panic!("Expected comparison for {}, got {:?}", reference, other),
        }
    }
}

#[test]
fn test_json_report_contents() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250401_sites.csv", &sample_data::register_older())
        .unwrap();
    fixture
        .create_snapshot("20250501_sites.csv", &sample_data::register_newer())
        .unwrap();

    fixture.compare(CompareOptions::default()).unwrap();

    let files = fixture.report_files();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("new_entries_report_"));
    assert!(name.ends_with(".json"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&files[0]).unwrap()).unwrap();
    let entries = report["new_entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["Location"], "Dunearn Road");
    assert_eq!(entries[1]["Location"], "Lentor Central");

    let summary = report["summary"].as_array().unwrap();
    let metric = |name: &str| {
        summary
            .iter()
            .find(|e| e["metric"] == name)
            .map(|e| e["value"].clone())
            .unwrap_or(serde_json::Value::Null)
    };
    assert_eq!(metric("New entries found"), 2);
    assert_eq!(metric("Newer file"), "20250501_sites.csv");
    assert_eq!(metric("Older file"), "20250401_sites.csv");
    assert_eq!(metric("Rows in newer file"), 5);
    assert_eq!(metric("Rows in older file"), 3);
    assert_eq!(metric("Key columns"), "Location");
    assert_eq!(metric("Newer file digest").as_str().unwrap().len(), 64);
}

#[test]
fn test_csv_report_format_override() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250401_sites.csv", &sample_data::register_older())
        .unwrap();
    fixture
        .create_snapshot("20250501_sites.csv", &sample_data::register_newer())
        .unwrap();

    fixture
        .compare(CompareOptions {
            format: Some(ReportFormat::Csv),
            ..CompareOptions::default()
        })
        .unwrap();

    let files = fixture.report_files();
    assert_eq!(files.len(), 2);
    let detail = files
        .iter()
        .find(|p| p.to_string_lossy().ends_with("_new_entries.csv"))
        .unwrap();
    let content = fs::read_to_string(detail).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("Location,Site Area (ha),Date of Award,Successful Tenderer"));
    assert!(lines.next().unwrap().starts_with("Dunearn Road,1.6,"));
    assert!(lines.next().unwrap().starts_with("Lentor Central,1.1,"));
    assert_eq!(lines.next(), None);
}

#[test]
fn test_no_new_entries_writes_no_report_unless_asked() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250401_sites.csv", &sample_data::register_older())
        .unwrap();
    fixture
        .create_snapshot("20250501_sites.csv", &sample_data::register_older())
        .unwrap();

    let outcome = fixture.compare(CompareOptions::default()).unwrap();
    assert_eq!(assertions::new_entries(&outcome), 0);
    assert!(fixture.report_files().is_empty());

    let outcome = fixture
        .compare(CompareOptions {
            always_report: true,
            ..CompareOptions::default()
        })
        .unwrap();
    match outcome {
        CompareOutcome::Compared { report: Some(report), .. } => {
            assert_eq!(report.paths.len(), 1);
            let value: serde_json::Value =
                serde_json::from_str(&fs::read_to_string(&report.paths[0]).unwrap()).unwrap();
            assert_eq!(value["new_entries"].as_array().unwrap().len(), 0);
        }
        other => panic!("Expected a written report, got {:?}", other),
    }
}

#[test]
fn test_report_output_directory_override() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250401_sites.csv", &sample_data::register_older())
        .unwrap();
    fixture
        .create_snapshot("20250501_sites.csv", &sample_data::register_newer())
        .unwrap();

    let outcome = fixture
        .compare(CompareOptions {
            output: Some("out/reports".into()),
            ..CompareOptions::default()
        })
        .unwrap();

    match outcome {
        CompareOutcome::Compared { report: Some(report), .. } => {
            assert!(report.paths[0].starts_with(fixture.root().join("out").join("reports")));
        }
        other => panic!("Expected a written report, got {:?}", other),
    }
    assert!(fixture.report_files().is_empty());
}

#[test]
fn test_compare_files_outside_the_store() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_csv("older.csv", &sample_data::ids(&["1", "2"])).unwrap();
    let newer = fixture.create_csv("newer.csv", &sample_data::ids(&["1", "2", "3"])).unwrap();

    let outcome = fixture
        .compare(CompareOptions {
            newer: Some(newer.display().to_string()),
            older: Some("older.csv".to_string()),
            ..CompareOptions::default()
        })
        .unwrap();
    assert_eq!(assertions::new_entries(&outcome), 1);
    match outcome {
        CompareOutcome::Compared { older: entry, .. } => assert_eq!(entry.path, fixture.root().join("older.csv")),
        other => panic!("Expected comparison, got {:?}", other),
    }
}

#[test]
fn test_unknown_snapshot_name() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250401_sites.csv", &sample_data::register_older())
        .unwrap();

    let err = fixture.compare_named("20250401_sites.csv", "missing.csv").unwrap_err();
    assert!(matches!(err, LandtrackError::SnapshotNotFound { .. }));
}

#[test]
fn test_explicit_keys() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot(
            "20250401_sites.csv",
            &[vec!["Location", "Tenderer"], vec!["Bedok", "Alpha"]],
        )
        .unwrap();
    fixture
        .create_snapshot(
            "20250501_sites.csv",
            &[vec!["Location", "Tenderer"], vec!["Bedok", "Alpha"], vec!["Bedok", "Beta"]],
        )
        .unwrap();

    let by_location = fixture
        .compare(CompareOptions {
            keys: vec!["Location".to_string()],
            ..CompareOptions::default()
        })
        .unwrap();
    assert_eq!(assertions::new_entries(&by_location), 0);

    let by_both = fixture
        .compare(CompareOptions {
            keys: vec!["Location".to_string(), "Tenderer".to_string()],
            ..CompareOptions::default()
        })
        .unwrap();
    assert_eq!(assertions::new_entries(&by_both), 1);

    let err = fixture
        .compare(CompareOptions {
            keys: vec!["Price".to_string()],
            ..CompareOptions::default()
        })
        .unwrap_err();
    assert!(matches!(err, LandtrackError::InvalidInput { .. }));
}

#[test]
fn test_store_orders_by_retrieval_date() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_snapshot("20250501_b.csv", &sample_data::ids(&["1"])).unwrap();
    fixture.create_snapshot("20241201_z.csv", &sample_data::ids(&["1"])).unwrap();
    fixture.create_snapshot("20250501_a.csv", &sample_data::ids(&["1"])).unwrap();

    let store = DirectorySnapshotStore::new(&fixture.workspace.snapshots_dir).unwrap();
    let names: Vec<String> = store
        .list_available_snapshots()
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["20241201_z.csv", "20250501_a.csv", "20250501_b.csv"]);
}

#[test]
fn test_cli_compare_and_list() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture
        .create_snapshot("20250401_sites.csv", &sample_data::register_older())
        .unwrap();
    fixture
        .create_snapshot("20250501_sites.csv", &sample_data::register_newer())
        .unwrap();

    runner.expect_success(&["list"]);
    runner.expect_success(&["list", "--format", "json"]);
    runner.expect_success(&["keys", "20250501_sites.csv"]);
    runner.expect_success(&["compare", "--format", "csv"]);
    assert_eq!(fixture.report_files().len(), 2);

    let err = runner.expect_failure(&["compare", "--format", "xlsx"]);
    assert!(matches!(err, LandtrackError::InvalidInput { .. }));
    let err = runner.expect_failure(&["list", "--format", "yaml"]);
    assert!(matches!(err, LandtrackError::InvalidInput { .. }));
}
