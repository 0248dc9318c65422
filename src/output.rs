//! Output formatting utilities

use crate::diff::DiffResult;
use crate::error::Result;
use crate::fetch::DownloadOutcome;
use crate::inference::{KeySelection, KeyStrategy};
use crate::listing::SiteRecord;
use crate::snapshot::Snapshot;
use crate::store::SnapshotEntry;
use crate::submission::SubmissionSummary;
use std::fmt::Write as _;

/// Number of new entries shown in the console summary
const SAMPLE_ENTRIES: usize = 5;

/// Pretty printer for landtrack output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print snapshot list
    pub fn print_snapshot_list(entries: &[SnapshotEntry]) {
        if entries.is_empty() {
            println!("No snapshots found.");
            return;
        }

        println!("📸 Available Snapshots:");
        for (i, entry) in entries.iter().enumerate() {
            let prefix = if i == entries.len() - 1 { "└─" } else { "├─" };
            match entry.retrieved {
                Some(date) => println!("{} {} ({})", prefix, entry.name, date),
                None => println!("{} {} (undated)", prefix, entry.name),
            }
        }
    }

    /// Print inferred key columns for one snapshot
    pub fn print_keys(snapshot: &Snapshot, keys: &KeySelection) {
        println!("🔑 Key columns for {}", snapshot.name());
        println!("├─ Rows: {}", snapshot.row_count());
        println!("├─ Columns: {}", snapshot.column_count());
        println!("├─ Strategy: {}", strategy_label(keys.strategy));
        println!("└─ Key: {}", keys.columns.join(", "));
    }

    pub fn print_download(outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { path, bytes } => {
                println!("⬇️  Downloaded {} ({})", path.display(), format_bytes(*bytes))
            }
            DownloadOutcome::AlreadyPresent { path } => {
                println!("✅ Today's file already exists: {}", path.display())
            }
        }
    }

    pub fn print_first_run(current: &SnapshotEntry) {
        println!("🆕 No previous snapshot to compare {} against.", current.name);
        println!("   It will be used as the baseline for the next run.");
    }

    /// Print the console summary of a comparison
    pub fn print_comparison(diff: &DiffResult<'_>) {
        print!("{}", render_comparison(diff));
    }

    pub fn print_submission_summary(summary: &SubmissionSummary) {
        println!("📝 Form submission");
        println!("├─ Submitted: {}", summary.submitted);
        println!("├─ Skipped: {}", summary.skipped);
        println!("└─ Failed: {}", summary.failed);
    }

    pub fn print_sites(sites: &[SiteRecord]) {
        if sites.is_empty() {
            println!("No sites found.");
            return;
        }

        println!("🏗️  Listed Sites:");
        for (i, site) in sites.iter().enumerate() {
            let prefix = if i == sites.len() - 1 { "└─" } else { "├─" };
            let status = if site.status.is_empty() { "-" } else { site.status.as_str() };
            match &site.details {
                Some(details) => println!("{} {} {} [{}] ({})", prefix, site.no, site.location, status, details),
                None => println!("{} {} {} [{}]", prefix, site.no, site.location, status),
            }
        }
    }
}

fn strategy_label(strategy: KeyStrategy) -> &'static str {
    match strategy {
        KeyStrategy::SingleCandidate => "single identifier column",
        KeyStrategy::CandidateCombination => "combination of identifier columns",
        KeyStrategy::SingleColumnFallback => "first unique column",
        KeyStrategy::FullRow => "full row (degraded)",
        KeyStrategy::NoCommonColumns => "none (no common columns)",
        KeyStrategy::Explicit => "explicit",
    }
}

/// Console summary of a comparison, with a sample of new entries whose key
/// columns are marked `*`
pub fn render_comparison(diff: &DiffResult<'_>) -> String {
    let mut out = String::new();
    let reconciliation = &diff.reconciliation;

    let _ = writeln!(out, "🔍 Comparison: {} → {}", diff.older.name(), diff.newer.name());
    let _ = writeln!(
        out,
        "├─ Newer: {} rows, {} columns",
        diff.newer.row_count(),
        diff.newer.column_count()
    );
    let _ = writeln!(
        out,
        "├─ Older: {} rows, {} columns",
        diff.older.row_count(),
        diff.older.column_count()
    );

    if reconciliation.has_drift() {
        let _ = writeln!(out, "├─ ⚠️  Column differences:");
        if !reconciliation.only_in_newer.is_empty() {
            let _ = writeln!(out, "│  ├─ Only in newer: {}", reconciliation.only_in_newer.join(", "));
        }
        if !reconciliation.only_in_older.is_empty() {
            let _ = writeln!(out, "│  ├─ Only in older: {}", reconciliation.only_in_older.join(", "));
        }
        let _ = writeln!(out, "│  └─ Using {} common columns", reconciliation.common.len());
    }

    let _ = writeln!(
        out,
        "├─ Key columns: {} ({})",
        if diff.keys.columns.is_empty() { "-".to_string() } else { diff.keys.columns.join(", ") },
        strategy_label(diff.keys.strategy)
    );
    if diff.keys.is_degraded() {
        for note in diff.diagnostics().iter().filter(|n| !n.starts_with("Columns only")) {
            let _ = writeln!(out, "├─ ⚠️  {}", note);
        }
    }

    let count = diff.new_entry_count();
    if count == 0 {
        let _ = writeln!(out, "└─ ✅ No new entries");
        return out;
    }

    let _ = writeln!(out, "└─ 🆕 New entries: {}", count);
    let shown = count.min(SAMPLE_ENTRIES);
    let columns = diff.newer.columns();
    for (i, row) in diff.new_rows().take(shown).enumerate() {
        let is_last = i == shown - 1 && count <= shown;
        let prefix = if is_last { "└─" } else { "├─" };

        let mut parts: Vec<String> = Vec::new();
        for key in &diff.keys.columns {
            if let Some(pos) = diff.newer.column_index(key) {
                parts.push(format!("*{}: {}", key, row[pos]));
            }
        }
        for (pos, column) in columns.iter().enumerate() {
            if !diff.keys.columns.contains(column) && !row[pos].is_empty() {
                parts.push(format!("{}: {}", column, row[pos]));
            }
        }
        let _ = writeln!(out, "   {} #{} {}", prefix, i + 1, parts.join(" | "));
    }
    if count > shown {
        let _ = writeln!(out, "   └─ ... and {} more", count - shown);
    }
    out
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    pub fn format_snapshot_list(entries: &[SnapshotEntry]) -> Result<String> {
        let json = serde_json::json!({
            "snapshot_count": entries.len(),
            "snapshots": entries,
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }
}

/// Format bytes in human-readable format
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
