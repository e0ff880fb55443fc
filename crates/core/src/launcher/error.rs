//! Error types for the download launcher.

use std::path::PathBuf;
use thiserror::Error;

use crate::progress::DownloadProgress;

/// Errors that can occur while fetching the payload or running the tool.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The torrent record has no link to fetch.
    #[error("Torrent record has no download link")]
    MissingLink,

    /// The payload request failed in transport.
    #[error("Failed to fetch torrent payload from {url}: {reason}")]
    PayloadFetch { url: String, reason: String },

    /// The payload request returned a non-success status.
    #[error("Torrent payload request to {url} returned HTTP {status}")]
    PayloadStatus { url: String, status: u16 },

    /// Writing the scratch file failed.
    #[error("Failed to write scratch file {}: {source}", .path.display())]
    ScratchWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The download tool binary was not found.
    #[error("Download tool not found: {}", .program.display())]
    ToolNotFound { program: PathBuf },

    /// The download tool exited unsuccessfully.
    #[error("Download tool exited with code {code:?} at {:.1}%", .progress.percent)]
    ToolFailed {
        code: Option<i32>,
        progress: DownloadProgress,
    },

    /// The download tool exceeded its deadline and was killed.
    #[error("Download tool timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The output monitor task did not complete.
    #[error("Progress monitor failed: {0}")]
    Monitor(String),

    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// I/O error while running the tool.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LaunchError {
    /// Creates a payload fetch error.
    pub fn payload_fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::PayloadFetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::PayloadFetch { .. } | Self::Timeout { .. } => true,
            Self::PayloadStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
