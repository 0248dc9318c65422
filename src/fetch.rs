//! HTTP retrieval of the published register

use crate::config::HttpConfig;
use crate::error::{LandtrackError, Result};
use crate::progress::create_file_progress;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A configured HTTP client, built once and passed by reference to
/// everything that talks to the network
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    follow_delay: Duration,
}

impl HttpSession {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            follow_delay: Duration::from_millis(config.follow_delay_ms),
        })
    }

    /// Pause between successive requests to the same site
    pub fn follow_delay(&self) -> Duration {
        self.follow_delay
    }

    /// GET a URL, treating non-success statuses as errors
    pub fn get(&self, url: &str) -> Result<Response> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| LandtrackError::download(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LandtrackError::download(url, format!("HTTP status {}", status)));
        }
        Ok(response)
    }

    pub fn get_text(&self, url: &str) -> Result<String> {
        self.get(url)?
            .text()
            .map_err(|e| LandtrackError::download(url, e.to_string()))
    }

    pub fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<()> {
        log::debug!("POST {}", url);
        let response = self.client.post(url).json(body).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(LandtrackError::submission(format!(
                "{} responded with HTTP status {}",
                url, status
            )));
        }
        Ok(())
    }
}

/// What a download attempt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { path: PathBuf, bytes: u64 },
    /// Today's file was already on disk; nothing was fetched
    AlreadyPresent { path: PathBuf },
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded { path, .. } | Self::AlreadyPresent { path } => path,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Downloaded { .. })
    }
}

/// Sibling path used while a download is in flight
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    destination.with_file_name(name)
}

/// Download `url` to `destination` unless it already exists. The body is
/// streamed to a `.tmp` sibling which is renamed into place on success.
pub fn download_snapshot(
    session: &HttpSession,
    url: &str,
    destination: &Path,
    show_progress: bool,
) -> Result<DownloadOutcome> {
    if destination.exists() {
        log::info!("Today's file already exists: {}", destination.display());
        return Ok(DownloadOutcome::AlreadyPresent {
            path: destination.to_path_buf(),
        });
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    log::info!("Downloading from: {}", url);
    let response = session.get(url)?;
    let temp_path = partial_path(destination);

    let bytes = match stream_to_file(response, &temp_path, show_progress) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(LandtrackError::download(url, e.to_string()));
        }
    };

    if bytes == 0 {
        let _ = fs::remove_file(&temp_path);
        return Err(LandtrackError::download(url, "empty response body"));
    }

    fs::rename(&temp_path, destination)?;
    log::info!("File saved to: {} ({} bytes)", destination.display(), bytes);

    Ok(DownloadOutcome::Downloaded {
        path: destination.to_path_buf(),
        bytes,
    })
}

fn stream_to_file(mut response: Response, path: &Path, show_progress: bool) -> Result<u64> {
    let pb = show_progress.then(|| create_file_progress(response.content_length(), "Downloading"));
    let mut file = File::create(path)?;
    let mut buffer = [0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let read = response.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])?;
        total += read as u64;
        if let Some(pb) = &pb {
            pb.inc(read as u64);
        }
    }
    file.sync_all()?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(total)
}
