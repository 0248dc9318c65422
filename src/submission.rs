//! Propagation of new entries into a downstream form

use crate::cell::Cell;
use crate::error::{LandtrackError, Result};
use crate::fetch::HttpSession;
use crate::snapshot::Record;
use chrono::{Local, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Date layouts accepted in text cells destined for date fields
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%m-%d-%Y"];

/// Layout the form expects for dates
const FORM_DATE_FORMAT: &str = "%d/%m/%Y";

/// Maps one form field to the snapshot column(s) that can fill it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field: String,
    /// Alternative column names, tried in order
    pub columns: Vec<String>,
    #[serde(default)]
    pub is_date: bool,
}

impl FieldMapping {
    pub fn text(field: &str, columns: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            is_date: false,
        }
    }

    pub fn date(field: &str, columns: &[&str]) -> Self {
        Self {
            is_date: true,
            ..Self::text(field, columns)
        }
    }

    /// First non-empty value among the alternative columns
    pub fn source_value<'r>(&self, record: &'r Record) -> Option<&'r Cell> {
        self.columns.iter().find_map(|wanted| {
            let wanted = wanted.trim();
            record
                .iter()
                .find(|(name, cell)| name.trim() == wanted && !cell.is_empty())
                .map(|(_, cell)| cell)
        })
    }

    /// Value as it should be typed into the form
    pub fn render(&self, record: &Record) -> Option<String> {
        let cell = self.source_value(record)?;
        Some(if self.is_date {
            format_date_for_form(cell)
        } else {
            cell.to_string()
        })
    }
}

/// One new entry ready for submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormEntry {
    /// 1-based position among the new entries
    pub entry: usize,
    /// Snapshot the entry was found in
    pub source: String,
    pub fields: IndexMap<String, String>,
}

/// Build the form field values for a new row; fields without data are omitted
pub fn map_record(record: &Record, mappings: &[FieldMapping]) -> IndexMap<String, String> {
    let mut fields = IndexMap::new();
    for mapping in mappings {
        match mapping.render(record) {
            Some(value) => {
                fields.insert(mapping.field.clone(), value);
            }
            None => log::debug!("No data for {}", mapping.field),
        }
    }
    fields
}

/// Render a cell as `dd/mm/yyyy`; text that is not a recognised date is
/// passed through unchanged
pub fn format_date_for_form(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => match parse_date_text(s.trim()) {
            Some(date) => date.format(FORM_DATE_FORMAT).to_string(),
            None => {
                log::warn!("Could not format date '{}', please enter it manually", s);
                s.clone()
            }
        },
        _ => match cell.as_date() {
            Some(date) => date.format(FORM_DATE_FORMAT).to_string(),
            None => {
                log::warn!("Could not format date '{}', please enter it manually", cell);
                cell.to_string()
            }
        },
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|fmt| {
                NaiveDateTime::parse_from_str(text, &format!("{} %H:%M:%S", fmt))
                    .ok()
                    .map(|dt| dt.date())
            })
        })
}

/// Decides whether a new entry should be submitted
pub trait Approver {
    /// `entry` is the 1-based position among the new entries
    fn approve(&mut self, entry: usize, record: &Record) -> Result<bool>;
}

impl<F> Approver for F
where
    F: FnMut(usize, &Record) -> bool,
{
    fn approve(&mut self, entry: usize, record: &Record) -> Result<bool> {
        Ok(self(entry, record))
    }
}

/// Approves every entry
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproveAll;

impl Approver for ApproveAll {
    fn approve(&mut self, _entry: usize, _record: &Record) -> Result<bool> {
        Ok(true)
    }
}

/// Approves a pre-computed set of entry numbers
#[derive(Debug, Clone, Default)]
pub struct ApproveList {
    approved: HashSet<usize>,
}

impl ApproveList {
    pub fn new(entries: impl IntoIterator<Item = usize>) -> Self {
        Self {
            approved: entries.into_iter().collect(),
        }
    }
}

impl Approver for ApproveList {
    fn approve(&mut self, entry: usize, _record: &Record) -> Result<bool> {
        Ok(self.approved.contains(&entry))
    }
}

/// Shows each entry and asks for a y/n answer
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Approver for ConsolePrompt<R, W> {
    fn approve(&mut self, entry: usize, record: &Record) -> Result<bool> {
        writeln!(self.output, "\nEntry {}:", entry)?;
        for (column, value) in record {
            writeln!(self.output, "  {}: {}", column, value)?;
        }
        write!(self.output, "Submit entry {} to the form? (y/n): ", entry)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(LandtrackError::Cancelled);
        }
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

/// Destination for approved entries
pub trait FormSubmitter {
    fn submit(&mut self, entry: &FormEntry) -> Result<()>;

    /// Short description for log output
    fn describe(&self) -> String;
}

/// Appends entries as JSON lines to a local outbox file
#[derive(Debug, Clone)]
pub struct OutboxSubmitter {
    path: PathBuf,
}

#[derive(Serialize)]
struct OutboxLine<'a> {
    queued_at: String,
    #[serde(flatten)]
    entry: &'a FormEntry,
}

impl OutboxSubmitter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FormSubmitter for OutboxSubmitter {
    fn submit(&mut self, entry: &FormEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(&OutboxLine {
            queued_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            entry,
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("outbox {}", self.path.display())
    }
}

/// Posts entries as JSON to a webhook
pub struct WebhookSubmitter<'a> {
    session: &'a HttpSession,
    endpoint: String,
}

impl<'a> WebhookSubmitter<'a> {
    pub fn new(session: &'a HttpSession, endpoint: impl Into<String>) -> Self {
        Self {
            session,
            endpoint: endpoint.into(),
        }
    }
}

impl FormSubmitter for WebhookSubmitter<'_> {
    fn submit(&mut self, entry: &FormEntry) -> Result<()> {
        self.session
            .post_json(&self.endpoint, entry)
            .map_err(|e| LandtrackError::submission(format!("entry {}: {}", entry.entry, e)))
    }

    fn describe(&self) -> String {
        format!("webhook {}", self.endpoint)
    }
}

/// Tally of a propagation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionSummary {
    pub submitted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Offer each new record to the approver and submit the approved ones.
/// A failed submission is logged and counted; it does not stop the run.
pub fn propagate(
    records: &[Record],
    source: &str,
    mappings: &[FieldMapping],
    approver: &mut dyn Approver,
    submitter: &mut dyn FormSubmitter,
) -> Result<SubmissionSummary> {
    let mut summary = SubmissionSummary::default();

    for (i, record) in records.iter().enumerate() {
        let number = i + 1;
        if !approver.approve(number, record)? {
            log::info!("Skipping entry {}", number);
            summary.skipped += 1;
            continue;
        }

        let fields = map_record(record, mappings);
        if fields.is_empty() {
            log::warn!("Entry {} has no values for any form field; skipping", number);
            summary.skipped += 1;
            continue;
        }

        let entry = FormEntry {
            entry: number,
            source: source.to_string(),
            fields,
        };
        match submitter.submit(&entry) {
            Ok(()) => {
                log::info!("Submitted entry {} to {}", number, submitter.describe());
                summary.submitted += 1;
            }
            Err(e) => {
                log::error!("Failed to submit entry {}: {}", number, e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
