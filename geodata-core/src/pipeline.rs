// Fetch-and-bundle pipeline: download every resolved link into a private
// scratch directory, one at a time, then zip whatever arrived.

use crate::bundle::{ARCHIVE_MIME_TYPE, archive_name, write_archive};
use crate::config::{DEFAULT_ARCHIVE_PREFIX, is_plain_filename};
use crate::error::{CoreError, Result};
use crate::report::outcome_line;
use chrono::Local;
use futures::StreamExt;
use geodata_scanner::client::{DEFAULT_DOWNLOAD_TIMEOUT_SECS, download_client};
use geodata_scanner::{ResolvedLink, ScanError};
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const DOWNLOADS_DIR: &str = "downloads";

/// Options for configuring a pipeline run
pub struct PipelineOptions {
    pub download_timeout_secs: u64,
    pub archive_prefix: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
        }
    }
}

/// Items processed so far out of the run total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion in `0.0..=1.0`. A run with nothing to do counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Callback for reporting per-item progress
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Callback for human-readable status lines
pub type LogCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadStatus {
    Succeeded { bytes: u64 },
    Failed { error: String },
}

/// What happened to one resolved link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadOutcome {
    pub filename: String,
    pub origin: String,
    pub url: String,
    #[serde(flatten)]
    pub status: DownloadStatus,
}

impl DownloadOutcome {
    fn new(link: &ResolvedLink, status: DownloadStatus) -> Self {
        Self {
            filename: link.filename.clone(),
            origin: link.origin.clone(),
            url: link.url.clone(),
            status,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.status, DownloadStatus::Succeeded { .. })
    }

    pub fn error_detail(&self) -> Option<&str> {
        match &self.status {
            DownloadStatus::Failed { error } => Some(error),
            DownloadStatus::Succeeded { .. } => None,
        }
    }
}

/// Run-exclusive temporary directory.
///
/// Nothing removes it implicitly: call [`ScratchDir::release`] once the
/// bundle has been consumed.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("geodata-").tempdir()?;
        Ok(Self { path: dir.keep() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn downloads(&self) -> PathBuf {
        self.path.join(DOWNLOADS_DIR)
    }

    /// Remove the directory and everything in it. Failures are logged and
    /// swallowed; the bundle has already been delivered by then.
    pub fn release(self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => info!("Removed scratch directory {}", self.path.display()),
            Err(e) => warn!(
                "Could not remove scratch directory {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// The final archive, ready to hand to a user
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
}

/// Output of one pipeline run
#[derive(Debug)]
pub struct BundleResult {
    pub archive_path: PathBuf,
    pub outcomes: Vec<DownloadOutcome>,
    pub scratch: ScratchDir,
}

impl BundleResult {
    pub fn archive_name(&self) -> String {
        self.archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }

    /// Load the archive for delivery. Call before [`release`](Self::release).
    pub fn read_artifact(&self) -> Result<Artifact> {
        Ok(Artifact {
            bytes: fs::read(&self.archive_path)?,
            file_name: self.archive_name(),
            mime_type: ARCHIVE_MIME_TYPE,
        })
    }

    /// Drop the scratch directory, archive included.
    pub fn release(self) {
        self.scratch.release();
    }
}

/// Download `links` sequentially and bundle the successful ones.
///
/// A failed download is recorded in the outcomes and the run moves on. The
/// run itself only fails if the scratch directory or the archive cannot be
/// created.
pub async fn run_pipeline(
    links: &[ResolvedLink],
    options: &PipelineOptions,
    progress_callback: Option<ProgressCallback>,
    log_callback: Option<LogCallback>,
) -> Result<BundleResult> {
    let client = download_client(options.download_timeout_secs)?;
    let scratch = ScratchDir::create()?;
    let downloads = scratch.downloads();

    if let Err(e) = fs::create_dir(&downloads) {
        scratch.release();
        return Err(e.into());
    }

    info!(
        "Downloading {} archive(s) into {}",
        links.len(),
        scratch.path().display()
    );

    let log = |line: String| {
        if let Some(ref callback) = log_callback {
            callback(line);
        }
    };

    let total = links.len();
    let mut outcomes = Vec::with_capacity(total);
    let mut used_names = HashSet::new();

    for (idx, link) in links.iter().enumerate() {
        let status = if !is_plain_filename(&link.filename) {
            DownloadStatus::Failed {
                error: format!("'{}' is not a valid file name", link.filename),
            }
        } else if !used_names.insert(link.filename.clone()) {
            DownloadStatus::Failed {
                error: "output filename already used earlier in this run".to_string(),
            }
        } else {
            info!("Downloading: {}", link.filename);
            let dest = downloads.join(&link.filename);
            match download_file(&client, &link.url, &dest).await {
                Ok(bytes) => DownloadStatus::Succeeded { bytes },
                Err(e) => {
                    remove_partial(&dest).await;
                    DownloadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            }
        };

        let outcome = DownloadOutcome::new(link, status);
        if let Some(error) = outcome.error_detail() {
            warn!("Download failed {}: {}", outcome.filename, error);
        }
        log(outcome_line(&outcome));
        outcomes.push(outcome);

        if let Some(ref callback) = progress_callback {
            callback(Progress {
                completed: idx + 1,
                total,
            });
        }
    }

    let archive_path = scratch
        .path()
        .join(archive_name(&options.archive_prefix, Local::now()));

    let bundled = {
        let downloads = downloads.clone();
        let archive_path = archive_path.clone();
        tokio::task::spawn_blocking(move || write_archive(&downloads, &archive_path)).await
    };

    let entries = match bundled {
        Ok(Ok(entries)) => entries,
        Ok(Err(e)) => {
            scratch.release();
            return Err(e);
        }
        Err(e) => {
            scratch.release();
            return Err(CoreError::Other(format!("Bundling task failed: {}", e)));
        }
    };

    info!(
        "Bundled {} file(s) into {}",
        entries.len(),
        archive_path.display()
    );

    Ok(BundleResult {
        archive_path,
        outcomes,
        scratch,
    })
}

/// Stream a response body to `dest` without holding it in memory.
async fn download_file(
    client: &Client,
    url: &str,
    dest: &Path,
) -> std::result::Result<u64, ScanError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScanError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    debug!("Wrote {} bytes to {}", written, dest.display());
    Ok(written)
}

async fn remove_partial(dest: &Path) {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => debug!("Removed partial download {}", dest.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial download {}: {}", dest.display(), e),
    }
}
