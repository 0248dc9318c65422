//! Command implementations for landtrack CLI

use crate::cli::{Commands, OutputFormat, SubmissionArgs};
use crate::diff::SnapshotDiffer;
use crate::error::{LandtrackError, Result};
use crate::fetch::{download_snapshot, DownloadOutcome, HttpSession};
use crate::hash::{digest_file, same_contents};
use crate::listing::{follow_awarded, save_listing, scrape_listing};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::report::{Report, ReportFormat, ReportWriter, WrittenReport};
use crate::store::{DirectorySnapshotStore, SnapshotEntry, SnapshotStore};
use crate::submission::{
    propagate, ApproveAll, ApproveList, Approver, ConsolePrompt, FormSubmitter, OutboxSubmitter,
    SubmissionSummary, WebhookSubmitter,
};
use crate::workspace::TrackerWorkspace;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands, workspace_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Init { force } => init_command(workspace_path, force),
        Commands::Fetch { url } => fetch_command(workspace_path, url.as_deref()),
        Commands::List { format } => list_command(workspace_path, &format),
        Commands::Keys { snapshot } => keys_command(workspace_path, &snapshot),
        Commands::Compare {
            newer,
            older,
            format,
            output,
            always_report,
            keys,
            submission,
        } => {
            let options = CompareOptions {
                newer,
                older,
                format: parse_report_format(format.as_deref())?,
                output,
                always_report,
                keys,
                approval: Approval::from_args(&submission),
                show_progress: true,
            };
            compare_command(workspace_path, &options)
        }
        Commands::Run {
            format,
            always_report,
            submission,
        } => {
            let options = CompareOptions {
                format: parse_report_format(format.as_deref())?,
                always_report,
                approval: Approval::from_args(&submission),
                show_progress: true,
                ..CompareOptions::default()
            };
            run_command(workspace_path, options)
        }
        Commands::Scrape { url, follow_awarded } => {
            scrape_command(workspace_path, url.as_deref(), follow_awarded)
        }
    }
}

fn parse_report_format(format: Option<&str>) -> Result<Option<ReportFormat>> {
    format
        .map(|f| ReportFormat::parse(f).map_err(LandtrackError::invalid_input))
        .transpose()
}

/// How new entries are approved for form submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Approval {
    /// Do not submit anything
    #[default]
    Disabled,
    /// Ask on the console for each entry
    Prompt,
    All,
    /// Pre-approved 1-based entry numbers
    List(Vec<usize>),
}

impl Approval {
    pub fn from_args(args: &SubmissionArgs) -> Self {
        if !args.submit {
            Self::Disabled
        } else if args.yes {
            Self::All
        } else if !args.approve.is_empty() {
            Self::List(args.approve.clone())
        } else {
            Self::Prompt
        }
    }

    fn approver(&self) -> Option<Box<dyn Approver>> {
        match self {
            Self::Disabled => None,
            Self::Prompt => Some(Box::new(ConsolePrompt::stdio())),
            Self::All => Some(Box::new(ApproveAll)),
            Self::List(entries) => Some(Box::new(ApproveList::new(entries.iter().copied()))),
        }
    }
}

/// Options for a comparison run
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    /// Newer snapshot name or path; the latest stored snapshot when unset
    pub newer: Option<String>,
    /// Older snapshot name or path; the newer one's predecessor when unset
    pub older: Option<String>,
    /// Overrides the configured report format
    pub format: Option<ReportFormat>,
    /// Overrides the workspace reports directory
    pub output: Option<PathBuf>,
    pub always_report: bool,
    /// Explicit key columns; inferred when empty
    pub keys: Vec<String>,
    pub approval: Approval,
    pub show_progress: bool,
}

/// Result of a comparison run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareOutcome {
    /// Nothing earlier to compare against
    FirstRun { current: SnapshotEntry },
    Compared {
        newer: SnapshotEntry,
        older: SnapshotEntry,
        key_columns: Vec<String>,
        new_entries: usize,
        report: Option<WrittenReport>,
        submission: Option<SubmissionSummary>,
    },
}

/// Initialize landtrack workspace
fn init_command(workspace_path: Option<&Path>, force: bool) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let root = workspace_path.unwrap_or(&current_dir);

    // Always initialize in the given directory rather than a parent workspace
    let workspace = TrackerWorkspace::create_new(root.to_path_buf())?;
    if force {
        workspace.write_config(&crate::config::TrackerConfig::default(), true)?;
    }

    println!("✅ Initialized landtrack workspace at: {}", workspace.root.display());
    println!("📁 Workspace directory: {}", workspace.landtrack_dir.display());

    Ok(())
}

/// Download today's snapshot into the workspace
pub fn fetch_latest(
    workspace: &TrackerWorkspace,
    url: Option<&str>,
    show_progress: bool,
) -> Result<DownloadOutcome> {
    let config = workspace.config()?;
    let session = HttpSession::new(&config.http)?;
    let url = url.unwrap_or(&config.source_url);
    let destination = workspace.snapshot_path_for(&config, TrackerWorkspace::today());

    let outcome = download_snapshot(&session, url, &destination, show_progress)?;

    if outcome.is_fresh() {
        let store = DirectorySnapshotStore::new(&workspace.snapshots_dir)?;
        let current = store.entry_for(outcome.path());
        if let Some(previous) = store.previous(&current)? {
            if same_contents(outcome.path(), &previous.path)? {
                log::info!("Downloaded file is identical to {}", previous.name);
            }
        }
    }

    Ok(outcome)
}

fn fetch_command(workspace_path: Option<&Path>, url: Option<&str>) -> Result<()> {
    let workspace = TrackerWorkspace::find_or_create(workspace_path)?;
    let outcome = fetch_latest(&workspace, url, true)?;
    PrettyPrinter::print_download(&outcome);
    Ok(())
}

fn list_command(workspace_path: Option<&Path>, format: &str) -> Result<()> {
    let workspace = TrackerWorkspace::find_or_create(workspace_path)?;
    let output_format = OutputFormat::parse(format).map_err(LandtrackError::invalid_input)?;
    let store = DirectorySnapshotStore::new(&workspace.snapshots_dir)?;
    let entries = store.list_available_snapshots()?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_snapshot_list(&entries),
        OutputFormat::Json => println!("{}", JsonFormatter::format_snapshot_list(&entries)?),
    }

    Ok(())
}

fn keys_command(workspace_path: Option<&Path>, snapshot: &str) -> Result<()> {
    let workspace = TrackerWorkspace::find_or_create(workspace_path)?;
    let config = workspace.config()?;
    let store = DirectorySnapshotStore::new(&workspace.snapshots_dir)?;

    let entry = resolve_entry(&workspace, &store, snapshot)?;
    let loaded = store.load(&entry)?;
    let keys = config.key_inference().infer(&loaded);
    PrettyPrinter::print_keys(&loaded, &keys);

    Ok(())
}

/// A snapshot argument is either a path (relative to the current directory
/// or the workspace root) or the file name of a stored snapshot
fn resolve_entry(
    workspace: &TrackerWorkspace,
    store: &DirectorySnapshotStore,
    reference: &str,
) -> Result<SnapshotEntry> {
    let given = Path::new(reference);
    let path = if given.is_file() {
        given.to_path_buf()
    } else {
        workspace.resolve_path(given)
    };
    if path.is_file() {
        return Ok(store.entry_for(&path));
    }
    store.find(reference)
}

fn compare_command(workspace_path: Option<&Path>, options: &CompareOptions) -> Result<()> {
    let workspace = TrackerWorkspace::find_or_create(workspace_path)?;
    compare_snapshots(&workspace, options)?;
    Ok(())
}

/// Compare two snapshots, print the summary, and write a report and submit
/// new entries as the options ask
pub fn compare_snapshots(workspace: &TrackerWorkspace, options: &CompareOptions) -> Result<CompareOutcome> {
    let config = workspace.config()?;
    let store = DirectorySnapshotStore::new(&workspace.snapshots_dir)?;

    let newer_entry = match &options.newer {
        Some(reference) => resolve_entry(workspace, &store, reference)?,
        None => store.latest()?.ok_or_else(|| {
            LandtrackError::invalid_input(format!(
                "No snapshots in {}; run `landtrack fetch` first",
                workspace.snapshots_dir.display()
            ))
        })?,
    };

    let older_entry = match &options.older {
        Some(reference) => resolve_entry(workspace, &store, reference)?,
        None => match store.previous(&newer_entry)? {
            Some(entry) => entry,
            None => {
                PrettyPrinter::print_first_run(&newer_entry);
                return Ok(CompareOutcome::FirstRun { current: newer_entry });
            }
        },
    };

    let mut progress = if options.show_progress {
        ProgressReporter::new_for_compare()
    } else {
        ProgressReporter::new_minimal()
    };

    let newer = store.load(&newer_entry)?;
    let older = store.load(&older_entry)?;
    progress.finish_load(&format!(
        "Loaded {} and {}",
        newer_entry.name, older_entry.name
    ));

    let differ = SnapshotDiffer::new(config.key_inference());
    let diff = if options.keys.is_empty() {
        differ.diff(&newer, &older)
    } else {
        differ.diff_with_keys(&newer, &older, &options.keys)?
    };
    progress.finish_diff(&format!("{} new entries", diff.new_entry_count()));

    PrettyPrinter::print_comparison(&diff);

    let report = if diff.has_new_entries() || options.always_report {
        let report = Report::from_diff(&diff, Local::now().naive_local())
            .with_digests(&digest_file(&newer_entry.path)?, &digest_file(&older_entry.path)?);
        let dir = options
            .output
            .as_deref()
            .map(|p| workspace.resolve_path(p))
            .unwrap_or_else(|| workspace.reports_dir.clone());
        let writer = ReportWriter::new(options.format.unwrap_or(config.report_format));
        progress.update_report(&format!("Writing {} report...", writer.format()));
        let written = writer.write(&report, &dir)?;
        progress.finish_report(&format!("Wrote {} file(s)", written.paths.len()));
        for path in &written.paths {
            println!("📄 Report saved to: {}", path.display());
        }
        Some(written)
    } else {
        log::info!("No new entries; skipping report");
        None
    };

    let submission = match options.approval.approver() {
        Some(mut approver) if diff.has_new_entries() => {
            let summary = submit_new_entries(workspace, &config, &diff.new_records(), &newer_entry.name, approver.as_mut())?;
            PrettyPrinter::print_submission_summary(&summary);
            Some(summary)
        }
        _ => None,
    };

    Ok(CompareOutcome::Compared {
        key_columns: diff.keys.columns.clone(),
        new_entries: diff.new_entry_count(),
        newer: newer_entry,
        older: older_entry,
        report,
        submission,
    })
}

fn submit_new_entries(
    workspace: &TrackerWorkspace,
    config: &crate::config::TrackerConfig,
    records: &[crate::snapshot::Record],
    source: &str,
    approver: &mut dyn Approver,
) -> Result<SubmissionSummary> {
    let mappings = &config.form.fields;
    match &config.form.endpoint {
        Some(endpoint) => {
            let session = HttpSession::new(&config.http)?;
            let mut submitter = WebhookSubmitter::new(&session, endpoint.clone());
            log::info!("Submitting to {}", submitter.describe());
            propagate(records, source, mappings, approver, &mut submitter)
        }
        None => {
            let mut submitter = OutboxSubmitter::new(workspace.outbox_path(config));
            log::info!("Queueing to {}", submitter.describe());
            propagate(records, source, mappings, approver, &mut submitter)
        }
    }
}

fn run_command(workspace_path: Option<&Path>, mut options: CompareOptions) -> Result<()> {
    let workspace = TrackerWorkspace::find_or_create(workspace_path)?;
    let outcome = fetch_latest(&workspace, None, options.show_progress)?;
    PrettyPrinter::print_download(&outcome);

    options.newer = Some(outcome.path().display().to_string());
    compare_snapshots(&workspace, &options)?;
    Ok(())
}

/// Scrape the listing page, save it, and compare it with the previous listing
pub fn scrape_listing_into(
    workspace: &TrackerWorkspace,
    url: Option<&str>,
    follow: bool,
) -> Result<(PathBuf, usize)> {
    let config = workspace.config()?;
    let session = HttpSession::new(&config.http)?;
    let url = url.unwrap_or(&config.listing_url);

    let mut sites = scrape_listing(&session, url)?;
    if sites.is_empty() {
        return Err(LandtrackError::invalid_input(format!("No sites found on {}", url)));
    }

    if follow {
        let awarded = sites.iter().filter(|s| s.is_awarded()).count();
        if awarded > 0 {
            log::info!("Found {} awarded sites. Fetching details.", awarded);
            follow_awarded(&session, &mut sites);
        } else {
            log::info!("No awarded sites found.");
        }
    }

    PrettyPrinter::print_sites(&sites);
    let path = save_listing(&sites, &workspace.listings_dir, TrackerWorkspace::today())?;
    println!("💾 Listing saved to: {}", path.display());

    let store = DirectorySnapshotStore::new(&workspace.listings_dir)?;
    let current = store.entry_for(&path);
    if let Some(previous) = store.previous(&current)? {
        let newer = store.load(&current)?;
        let older = store.load(&previous)?;
        let diff = SnapshotDiffer::new(config.key_inference()).diff(&newer, &older);
        PrettyPrinter::print_comparison(&diff);
    }

    Ok((path, sites.len()))
}

fn scrape_command(workspace_path: Option<&Path>, url: Option<&str>, follow: bool) -> Result<()> {
    let workspace = TrackerWorkspace::find_or_create(workspace_path)?;
    scrape_listing_into(&workspace, url, follow)?;
    Ok(())
}
