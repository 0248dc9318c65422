//! Approval and outbox flow for newly found entries

use crate::common::{sample_data, CliTestRunner, TestFixture};
use landtrack::commands::{Approval, CompareOptions, CompareOutcome};
use landtrack::submission::SubmissionSummary;
use std::fs;

fn fixture_with_new_entries() -> TestFixture {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250401_sites.csv", &sample_data::register_older())
        .unwrap();
    fixture
        .create_snapshot("20250501_sites.csv", &sample_data::register_newer())
        .unwrap();
    fixture
}

fn outbox_lines(fixture: &TestFixture) -> Vec<serde_json::Value> {
    let config = fixture.workspace.config().unwrap();
    match fs::read_to_string(fixture.workspace.outbox_path(&config)) {
        Ok(content) => content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn summary_of(outcome: CompareOutcome) -> Option<SubmissionSummary> {
    match outcome {
        CompareOutcome::Compared { submission, .. } => submission,
        other => panic!("Expected comparison, got {:?}", other),
    }
}

#[test]
fn test_submission_disabled_by_default() {
    let fixture = fixture_with_new_entries();
    let outcome = fixture.compare(CompareOptions::default()).unwrap();

    assert_eq!(summary_of(outcome), None);
    assert!(outbox_lines(&fixture).is_empty());
}

#[test]
fn test_approve_all_queues_every_entry() {
    let fixture = fixture_with_new_entries();
    let outcome = fixture
        .compare(CompareOptions {
            approval: Approval::All,
            ..CompareOptions::default()
        })
        .unwrap();

    assert_eq!(
        summary_of(outcome),
        Some(SubmissionSummary {
            submitted: 2,
            skipped: 0,
            failed: 0
        })
    );

    let lines = outbox_lines(&fixture);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["entry"], 1);
    assert_eq!(lines[0]["source"], "20250501_sites.csv");
    assert_eq!(lines[0]["fields"]["Location"], "Dunearn Road");
    assert_eq!(lines[0]["fields"]["Date of Award"], "14/03/2025");
    assert!(lines[0]["queued_at"].is_string());
    assert_eq!(lines[1]["fields"]["Location"], "Lentor Central");
}

#[test]
fn test_approval_list_selects_entries() {
    let fixture = fixture_with_new_entries();
    let outcome = fixture
        .compare(CompareOptions {
            approval: Approval::List(vec![2]),
            ..CompareOptions::default()
        })
        .unwrap();

    assert_eq!(
        summary_of(outcome),
        Some(SubmissionSummary {
            submitted: 1,
            skipped: 1,
            failed: 0
        })
    );
    let lines = outbox_lines(&fixture);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["entry"], 2);
    assert_eq!(lines[0]["fields"]["Location"], "Lentor Central");
}

#[test]
fn test_nothing_new_submits_nothing() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_snapshot("20250401_sites.csv", &sample_data::register_older())
        .unwrap();
    fixture
        .create_snapshot("20250501_sites.csv", &sample_data::register_older())
        .unwrap();

    let outcome = fixture
        .compare(CompareOptions {
            approval: Approval::All,
            ..CompareOptions::default()
        })
        .unwrap();
    assert_eq!(summary_of(outcome), None);
    assert!(outbox_lines(&fixture).is_empty());
}

#[test]
fn test_outbox_appends_across_runs() {
    let fixture = fixture_with_new_entries();
    for _ in 0..2 {
        fixture
            .compare(CompareOptions {
                approval: Approval::List(vec![1]),
                ..CompareOptions::default()
            })
            .unwrap();
    }
    assert_eq!(outbox_lines(&fixture).len(), 2);
}

#[test]
fn test_custom_field_mapping_and_outbox_location() {
    let fixture = fixture_with_new_entries();
    let mut config = fixture.workspace.config().unwrap();
    config.form.outbox = "queue/forms.jsonl".to_string();
    config.form.fields = serde_json::from_value(serde_json::json!([
        {"field": "Site", "columns": ["Site Name", " Location "]},
        {"field": "Awarded on", "columns": ["Date of Award"], "is_date": true},
        {"field": "Price", "columns": ["Tendered Price ($)"]}
    ]))
    .unwrap();
    fixture.workspace.write_config(&config, true).unwrap();

    fixture
        .compare(CompareOptions {
            approval: Approval::All,
            ..CompareOptions::default()
        })
        .unwrap();

    let path = fixture.workspace.landtrack_dir.join("queue").join("forms.jsonl");
    let first: serde_json::Value =
        serde_json::from_str(fs::read_to_string(path).unwrap().lines().next().unwrap()).unwrap();
    let fields = first["fields"].as_object().unwrap();
    assert_eq!(fields["Site"], "Dunearn Road");
    assert_eq!(fields["Awarded on"], "14/03/2025");
    assert!(!fields.contains_key("Price"));
}

#[test]
fn test_cli_submit_yes_writes_outbox() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture
        .create_snapshot("20250401_sites.csv", &sample_data::register_older())
        .unwrap();
    fixture
        .create_snapshot("20250501_sites.csv", &sample_data::register_newer())
        .unwrap();

    runner.expect_success(&["compare", "--submit", "--approve", "1"]);
    assert_eq!(outbox_lines(fixture).len(), 1);

    runner.expect_success(&["compare", "--submit", "--yes"]);
    assert_eq!(outbox_lines(fixture).len(), 3);
}
