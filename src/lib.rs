//! # landtrack
//!
//! Tracks a periodically published land-sales register: downloads dated
//! snapshots, infers which columns identify a row, reports rows appended
//! since the previous snapshot and optionally hands them to a downstream form.

pub mod cell;
pub mod cli;
pub mod commands;
pub mod config;
pub mod csv;
pub mod data;
pub mod diff;
pub mod error;
pub mod fetch;
pub mod hash;
pub mod html;
pub mod inference;
pub mod listing;
pub mod output;
pub mod progress;
pub mod report;
pub mod snapshot;
pub mod store;
pub mod submission;
pub mod workbook;
pub mod workspace;

pub use cell::Cell;
pub use diff::{diff_snapshots, DiffResult, SnapshotDiffer};
pub use error::{LandtrackError, Result};
pub use inference::{infer_key_columns, KeyInference, KeySelection, KeyStrategy};
pub use snapshot::{Record, Snapshot};
pub use store::{DirectorySnapshotStore, SnapshotEntry, SnapshotStore};
pub use workspace::TrackerWorkspace;

/// Current format version for landtrack configuration files
pub const FORMAT_VERSION: &str = "1.0.0";
