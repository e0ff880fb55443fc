use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::SearchQuery;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default = "default_query")]
    pub query: SearchQuery,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            query: default_query(),
            selection: SelectionConfig::default(),
            downloader: DownloaderConfig::default(),
        }
    }
}

/// Catalog site configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Catalog site root (e.g., "https://yts.mx")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://yts.mx".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    concat!("reelgrab/", env!("CARGO_PKG_VERSION")).to_string()
}

/// The query run when no other is given: everything rated 9 and up.
fn default_query() -> SearchQuery {
    SearchQuery {
        rating: 9,
        ..SearchQuery::default()
    }
}

/// Which movie and which torrent to pick from the catalog results
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectionConfig {
    #[serde(default = "default_index")]
    pub movie_index: usize,
    #[serde(default = "default_index")]
    pub torrent_index: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            movie_index: default_index(),
            torrent_index: default_index(),
        }
    }
}

fn default_index() -> usize {
    1
}

/// External download tool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    /// Program to run (looked up on PATH when not absolute)
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Fixed arguments; the scratch file name is appended after them
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Directory the payload is written to and the tool runs in
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// File name of the payload inside `scratch_dir`
    #[serde(default = "default_scratch_file")]
    pub scratch_file: String,
    /// Deadline for the tool run in seconds (unset: no deadline)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Capacity of the progress update channel
    #[serde(default = "default_progress_buffer")]
    pub progress_buffer: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            scratch_dir: default_scratch_dir(),
            scratch_file: default_scratch_file(),
            timeout_secs: None,
            progress_buffer: default_progress_buffer(),
        }
    }
}

impl DownloaderConfig {
    /// Full path of the scratch payload file.
    pub fn scratch_path(&self) -> PathBuf {
        self.scratch_dir.join(&self.scratch_file)
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("npx")
}

fn default_args() -> Vec<String> {
    vec![
        "torrent-dl".to_string(),
        "--verbose".to_string(),
        "--input".to_string(),
    ]
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("movies")
}

fn default_scratch_file() -> String {
    "temp.torrent".to_string()
}

fn default_progress_buffer() -> usize {
    64
}
