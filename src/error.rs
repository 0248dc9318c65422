//! Error types for landtrack operations

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LandtrackError>;

#[derive(Error, Debug)]
pub enum LandtrackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Snapshot not found: {name}")]
    SnapshotNotFound { name: String },

    #[error("Snapshot unreadable: {path}: {reason}")]
    SnapshotUnreadable { path: PathBuf, reason: String },

    #[error("Download failed for {url}: {message}")]
    Download { url: String, message: String },

    #[error("Report could not be written to {path}: {message}")]
    Report { path: PathBuf, message: String },

    #[error("Submission error: {message}")]
    Submission { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl LandtrackError {
    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    pub fn snapshot_unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SnapshotUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn download(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: msg.into(),
        }
    }

    pub fn report(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Report {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// True for failures that only affect the snapshot being loaded.
    pub fn is_snapshot_unreadable(&self) -> bool {
        matches!(self, Self::SnapshotUnreadable { .. })
    }
}
