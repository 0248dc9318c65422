//! Workspace management for landtrack operations

use crate::config::TrackerConfig;
use crate::error::{LandtrackError, Result};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the workspace directory
pub const WORKSPACE_DIR: &str = ".landtrack";

/// Manages the .landtrack workspace directory
#[derive(Debug, Clone)]
pub struct TrackerWorkspace {
    /// Project root directory (where .landtrack/ lives)
    pub root: PathBuf,
    /// .landtrack/ directory path
    pub landtrack_dir: PathBuf,
    /// Downloaded register snapshots
    pub snapshots_dir: PathBuf,
    /// Comparison reports
    pub reports_dir: PathBuf,
    /// Scraped listing pages
    pub listings_dir: PathBuf,
}

impl TrackerWorkspace {
    /// Find existing workspace or create a new one
    pub fn find_or_create(start_dir: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let start = match start_dir {
            Some(dir) => current_dir.join(dir),
            None => current_dir,
        };

        if let Some(workspace) = Self::find_existing(&start) {
            workspace.ensure_dirs()?;
            return Ok(workspace);
        }

        Self::create_new(start)
    }

    /// Find existing workspace by walking up the directory tree
    fn find_existing(start_dir: &Path) -> Option<Self> {
        let mut current = start_dir;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Some(Self::from_root(current.to_path_buf()));
            }

            // A repository root is as far as we look
            if current.join(".git").exists() {
                return None;
            }

            current = current.parent()?;
        }
    }

    /// Create a new workspace in the specified root directory
    pub fn create_new(root: PathBuf) -> Result<Self> {
        let workspace = Self::from_root(root);
        workspace.ensure_dirs()?;
        workspace.write_config(&TrackerConfig::default(), false)?;

        log::info!("Created landtrack workspace at: {}", workspace.root.display());

        Ok(workspace)
    }

    /// Create workspace from root directory path
    pub fn from_root(root: PathBuf) -> Self {
        let landtrack_dir = root.join(WORKSPACE_DIR);
        Self {
            snapshots_dir: landtrack_dir.join("snapshots"),
            reports_dir: landtrack_dir.join("reports"),
            listings_dir: landtrack_dir.join("listings"),
            landtrack_dir,
            root,
        }
    }

    /// Create any missing workspace directories
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            &self.landtrack_dir,
            &self.snapshots_dir,
            &self.reports_dir,
            &self.listings_dir,
        ] {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                log::debug!("Created directory: {}", dir.display());
            }
        }
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.landtrack_dir.join("config.json")
    }

    /// Load the workspace configuration, using defaults if none is saved
    pub fn config(&self) -> Result<TrackerConfig> {
        TrackerConfig::load_or_default(&self.config_path())
    }

    /// Write configuration, leaving an existing file alone unless forced
    pub fn write_config(&self, config: &TrackerConfig, force: bool) -> Result<()> {
        let config_path = self.config_path();
        if config_path.exists() && !force {
            return Ok(());
        }
        config.save(&config_path)
    }

    /// Resolve a user-supplied path against the workspace root
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Where today's download lands
    pub fn snapshot_path_for(&self, config: &TrackerConfig, date: NaiveDate) -> PathBuf {
        self.snapshots_dir.join(config.snapshot_file_name(date))
    }

    /// Path of the submission outbox
    pub fn outbox_path(&self, config: &TrackerConfig) -> PathBuf {
        self.resolve_in_workspace(Path::new(&config.form.outbox))
    }

    fn resolve_in_workspace(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.landtrack_dir.join(path)
        }
    }

    /// Today's date in local time
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Fail early when the workspace directory is missing
    pub fn require_initialized(&self) -> Result<()> {
        if !self.landtrack_dir.is_dir() {
            return Err(LandtrackError::workspace(format!(
                "No workspace at {}; run `landtrack init` first",
                self.root.display()
            )));
        }
        Ok(())
    }
}
