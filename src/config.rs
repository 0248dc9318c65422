//! Workspace configuration stored in `.landtrack/config.json`

use crate::data::DataProcessor;
use crate::error::{LandtrackError, Result};
use crate::inference::{KeyInference, DEFAULT_KEY_PATTERNS};
use crate::report::ReportFormat;
use crate::submission::FieldMapping;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_SOURCE_URL: &str =
    "https://www.ura.gov.sg/-/media/Corporate/Land-Sales/Past-Sales-Sites/ura-vacant-sites.xlsx";
pub const DEFAULT_LISTING_URL: &str =
    "https://www.ura.gov.sg/Corporate/Land-Sales/Current-URA-GLS-Sites";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub version: String,
    /// Published spreadsheet to download
    pub source_url: String,
    /// Stem of downloaded snapshot names (`YYYYMMDD_<stem>.<ext>`)
    pub snapshot_stem: String,
    pub snapshot_extension: String,
    pub listing_url: String,
    pub http: HttpConfig,
    pub report_format: ReportFormat,
    /// Column-name substrings that mark identifier candidates
    pub key_patterns: Vec<String>,
    pub form: FormConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            version: crate::FORMAT_VERSION.to_string(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            snapshot_stem: "ura-vacant-sites".to_string(),
            snapshot_extension: "xlsx".to_string(),
            listing_url: DEFAULT_LISTING_URL.to_string(),
            http: HttpConfig::default(),
            report_format: ReportFormat::Json,
            key_patterns: DEFAULT_KEY_PATTERNS.iter().map(|p| p.to_string()).collect(),
            form: FormConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Read a config file, falling back to defaults for missing fields
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| LandtrackError::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file if present, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.snapshot_stem.trim().is_empty() {
            return Err(LandtrackError::config("snapshot_stem must not be empty"));
        }
        if self.snapshot_extension.trim().is_empty() {
            return Err(LandtrackError::config("snapshot_extension must not be empty"));
        }
        let sample = format!("snapshot.{}", self.snapshot_extension);
        if !DataProcessor::is_supported_format(Path::new(&sample)) {
            return Err(LandtrackError::config(format!(
                "snapshot_extension '{}' is not a readable format",
                self.snapshot_extension
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(LandtrackError::config("http.timeout_secs must be greater than 0"));
        }
        if self.key_patterns.iter().all(|p| p.trim().is_empty()) {
            return Err(LandtrackError::config("key_patterns must contain at least one pattern"));
        }
        for mapping in &self.form.fields {
            if mapping.columns.is_empty() {
                return Err(LandtrackError::config(format!(
                    "form field '{}' has no source columns",
                    mapping.field
                )));
            }
        }
        Ok(())
    }

    pub fn key_inference(&self) -> KeyInference {
        KeyInference::new(&self.key_patterns)
    }

    /// File name for a snapshot retrieved on the given day
    pub fn snapshot_file_name(&self, date: chrono::NaiveDate) -> String {
        format!(
            "{}_{}.{}",
            date.format("%Y%m%d"),
            self.snapshot_stem,
            self.snapshot_extension
        )
    }
}

/// Settings shared by every outgoing HTTP request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Pause between follow-up requests to the same site
    pub follow_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 60,
            follow_delay_ms: 2000,
        }
    }
}

/// Downstream form propagation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Webhook receiving JSON submissions; entries go to the outbox when unset
    pub endpoint: Option<String>,
    /// JSON-lines file (relative to the workspace directory) for queued entries
    pub outbox: String,
    pub fields: Vec<FieldMapping>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            outbox: "pending_submissions.jsonl".to_string(),
            fields: default_field_mappings(),
        }
    }
}

fn default_field_mappings() -> Vec<FieldMapping> {
    vec![
        FieldMapping::date("Date of Launch", &["Date of Launch"]),
        FieldMapping::date("Date of Tender Closing", &["Date of Tender Closing"]),
        FieldMapping::date("Date of Award", &["Date of Award"]),
        FieldMapping::text("Location", &["Location"]),
        FieldMapping::text("Type of Development Allowed", &["Type of Development Allowed"]),
        FieldMapping::text("Lease (years)", &["Lease (years)"]),
        FieldMapping::text(
            "Type of Devt Code",
            &["Type of Devt Code", "Type of Devt Code (Click here for explanation)"],
        ),
        FieldMapping::text("Site Area (m2)", &["Site Area (m2)"]),
        FieldMapping::text("Name of Successful Tenderer", &["Name of Successful Tenderer"]),
        FieldMapping::text("Successful Tender Price", &["Successful Tender Price"]),
    ]
}
