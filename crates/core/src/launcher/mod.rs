//! Download launcher.
//!
//! Fetches a torrent's payload into the scratch directory and runs the
//! external download tool on it, feeding the tool's output to the progress
//! monitor.

mod error;
mod tool;

pub use error::LaunchError;
pub use tool::{DownloadLauncher, DownloadOutcome, RunningDownload};
