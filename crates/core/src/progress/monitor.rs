//! Line-by-line parser for the download tool's progress table.
//!
//! The tool redraws a box-drawn table of peers once per refresh. A block
//! opens with a `├` line and closes with a `└` line; rows in between start
//! with `│` and carry the amount downloaded from each peer as the second
//! quoted segment. Lines outside the row region that mention a size unit
//! are total-size estimates ("Size | 1.4 GB").
//!
//! Anything that does not fit these shapes is ignored: the tool's output
//! format is not under our control and a line we cannot read must never
//! stop the download.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::session::{DownloadProgress, DownloadSession};
use super::units::parse_size_segment;

/// First character of the line that opens a table block.
pub const TABLE_OPEN: char = '\u{251c}';
/// First character of the line that closes a table block.
pub const TABLE_CLOSE: char = '\u{2514}';
/// First character of a data row.
pub const TABLE_ROW: char = '\u{2502}';

/// Separator between a detail line's label and its value.
const DETAIL_SEPARATOR: &str = " | ";
/// Tokens that mark a detail line as carrying a size.
const SIZE_TOKENS: [&str; 3] = ["KB", "MB", "GB"];
/// Marker of rows for peers that have sent nothing yet.
const EMPTY_ROW_MARKER: &str = "Bytes";

/// Where the monitor is relative to the progress table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableState {
    #[default]
    Outside,
    InsideTable,
}

/// Stateful parser turning tool output lines into session updates.
#[derive(Debug, Default)]
pub struct ProgressMonitor {
    state: TableState,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    /// Feeds one line of output.
    ///
    /// Returns a progress update when the line was a data row and a
    /// percentage could be computed.
    pub fn feed_line(
        &mut self,
        session: &mut DownloadSession,
        line: &str,
    ) -> Option<DownloadProgress> {
        let first = line.chars().next()?;

        if first == TABLE_OPEN {
            self.state = TableState::InsideTable;
        } else if first == TABLE_CLOSE {
            self.state = TableState::Outside;
            session.commit_cycle();
            debug!(
                downloaded_kb = session.downloaded_kb(),
                cycle = session.cycles(),
                "Progress block closed"
            );
        }

        if self.state == TableState::Outside || first != TABLE_ROW {
            read_detail_line(session, line);
            return None;
        }

        read_data_row(session, line)
    }
}

/// Updates the expected total from a detail line, if it carries a size.
fn read_detail_line(session: &mut DownloadSession, line: &str) {
    if !SIZE_TOKENS.iter().any(|unit| line.contains(unit)) {
        return;
    }

    let Some(value) = line.split(DETAIL_SEPARATOR).nth(1) else {
        return;
    };

    match parse_size_segment(value) {
        Ok(0) => {
            warn!(line = %line, "Ignoring zero total size");
        }
        Ok(kb) => {
            session.observe_expected(kb);
            debug!(expected_kb = session.expected_kb(), "Total size estimate");
        }
        Err(e) => {
            warn!(line = %line, error = %e, "Unreadable total size");
        }
    }
}

/// Adds a data row's downloaded amount to the current block.
fn read_data_row(session: &mut DownloadSession, line: &str) -> Option<DownloadProgress> {
    if line.matches(EMPTY_ROW_MARKER).count() > 1 {
        return None;
    }

    let Some(segment) = line.split('\'').nth(3) else {
        debug!(line = %line, "Row without amount segment");
        return None;
    };

    match parse_size_segment(segment) {
        Ok(kb) => session.add_in_flight(kb),
        Err(e) => {
            warn!(line = %line, error = %e, "Unreadable downloaded amount");
            return None;
        }
    }

    session.update_percent()?;
    Some(session.progress())
}

/// Reads the tool's output until EOF, feeding every line to a monitor.
///
/// Updates are offered to `progress_tx` without waiting; a slow or closed
/// receiver only loses updates. Returns the session once the stream ends.
pub async fn monitor_output<R>(
    reader: R,
    mut session: DownloadSession,
    progress_tx: Option<mpsc::Sender<DownloadProgress>>,
) -> DownloadSession
where
    R: AsyncBufRead + Unpin,
{
    let mut monitor = ProgressMonitor::new();
    let mut lines = reader.split(b'\n');

    loop {
        let raw = match lines.next_segment().await {
            Ok(Some(raw)) => raw,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Reading tool output failed");
                break;
            }
        };

        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches('\r');

        if let Some(progress) = monitor.feed_line(&mut session, line) {
            debug!(percent = progress.percent, "Download progress");
            if let Some(ref tx) = progress_tx {
                let _ = tx.try_send(progress);
            }
        }
    }

    session
}
