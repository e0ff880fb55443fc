//! Download progress tracking.
//!
//! Parses the external download tool's table output into a running
//! estimate of kilobytes expected and kilobytes downloaded.

mod monitor;
mod session;
mod units;

pub use monitor::{
    monitor_output, ProgressMonitor, TableState, TABLE_CLOSE, TABLE_OPEN, TABLE_ROW,
};
pub use session::{DownloadProgress, DownloadSession};
pub use units::{parse_size, parse_size_segment, strip_ansi, SizeParseError, SizeUnit};
