//! Ordered collections of retrieved snapshots

use crate::data::DataProcessor;
use crate::error::{LandtrackError, Result};
use crate::snapshot::Snapshot;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A snapshot known to a store, not yet loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    /// Retrieval date parsed from the name; `None` for undated files
    pub retrieved: Option<NaiveDate>,
    pub name: String,
    pub path: PathBuf,
}

impl SnapshotEntry {
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            retrieved: extract_retrieval_date(&name),
            name,
            path,
        }
    }

    fn sort_key(&self) -> (Option<NaiveDate>, &str) {
        (self.retrieved, &self.name)
    }
}

/// Retrieval date from a `YYYYMMDD_...` name
pub fn extract_retrieval_date(name: &str) -> Option<NaiveDate> {
    let prefix = name.get(..8)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) || name.as_bytes().get(8) != Some(&b'_') {
        return None;
    }
    NaiveDate::parse_from_str(prefix, "%Y%m%d").ok()
}

/// Source of snapshots ordered by retrieval date
pub trait SnapshotStore {
    /// Every available snapshot, oldest first; undated entries sort first
    fn list_available_snapshots(&self) -> Result<Vec<SnapshotEntry>>;

    fn load(&self, entry: &SnapshotEntry) -> Result<Snapshot>;

    /// The snapshot retrieved immediately before `current`, matched by
    /// retrieval date and name so copies outside the store order the same
    /// way. `None` means there is nothing to compare against yet.
    fn previous(&self, current: &SnapshotEntry) -> Result<Option<SnapshotEntry>> {
        let key = current.sort_key();
        Ok(self
            .list_available_snapshots()?
            .into_iter()
            .filter(|e| e.name != current.name && e.sort_key() < key)
            .last())
    }

    fn latest(&self) -> Result<Option<SnapshotEntry>> {
        Ok(self.list_available_snapshots()?.pop())
    }

    /// Look up an entry by file name
    fn find(&self, name: &str) -> Result<SnapshotEntry> {
        self.list_available_snapshots()?
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| LandtrackError::SnapshotNotFound {
                name: name.to_string(),
            })
    }
}

/// Snapshots stored as date-stamped files in one directory
pub struct DirectorySnapshotStore {
    dir: PathBuf,
    processor: DataProcessor,
}

impl DirectorySnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            dir: dir.into(),
            processor: DataProcessor::new()?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Entry for a file that may live outside the store directory
    pub fn entry_for(&self, path: &Path) -> SnapshotEntry {
        SnapshotEntry::from_path(path.to_path_buf())
    }
}

impl SnapshotStore for DirectorySnapshotStore {
    fn list_available_snapshots(&self) -> Result<Vec<SnapshotEntry>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file() && DataProcessor::is_supported_format(path) {
                entries.push(SnapshotEntry::from_path(path.to_path_buf()));
            }
        }

        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(entries)
    }

    fn load(&self, entry: &SnapshotEntry) -> Result<Snapshot> {
        self.processor.load_snapshot(&entry.path, entry.retrieved)
    }
}
