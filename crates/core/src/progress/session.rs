//! Per-download progress counters.

use serde::{Deserialize, Serialize};

/// Progress counters for one run of the download tool.
///
/// Created when the tool starts, updated only by the monitor reading its
/// output, handed back to the caller when the output ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSession {
    /// Largest total-size estimate seen so far, in KB.
    expected_kb: u64,
    /// Downloaded KB as of the last completed table block.
    downloaded_kb: u64,
    /// Downloaded KB summed over the rows of the block being read.
    in_flight_kb: u64,
    /// Last percentage reported.
    percent: Option<f64>,
    /// Table blocks completed.
    cycles: u64,
}

impl DownloadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected_kb(&self) -> u64 {
        self.expected_kb
    }

    pub fn downloaded_kb(&self) -> u64 {
        self.downloaded_kb
    }

    pub fn in_flight_kb(&self) -> u64 {
        self.in_flight_kb
    }

    pub fn percent(&self) -> Option<f64> {
        self.percent
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Records a total-size estimate; the expected total only ever grows.
    pub fn observe_expected(&mut self, kb: u64) {
        self.expected_kb = self.expected_kb.max(kb);
    }

    /// Adds a row's downloaded amount to the current block.
    pub fn add_in_flight(&mut self, kb: u64) {
        self.in_flight_kb = self.in_flight_kb.saturating_add(kb);
    }

    /// Closes the current block: its total becomes the downloaded figure and
    /// the accumulator starts over.
    pub fn commit_cycle(&mut self) {
        self.downloaded_kb = std::mem::take(&mut self.in_flight_kb);
        self.cycles += 1;
    }

    /// Recomputes the percentage from the last completed block.
    ///
    /// Returns `None` while no total-size estimate has been seen.
    pub fn update_percent(&mut self) -> Option<f64> {
        if self.expected_kb == 0 {
            return None;
        }
        let percent =
            (self.downloaded_kb as f64 / self.expected_kb as f64 * 100.0).min(100.0);
        self.percent = Some(percent);
        self.percent
    }

    /// Snapshot for reporting.
    pub fn progress(&self) -> DownloadProgress {
        DownloadProgress {
            expected_kb: self.expected_kb,
            downloaded_kb: self.downloaded_kb,
            percent: self.percent.unwrap_or(0.0),
        }
    }
}

/// A progress update sent to whoever is reporting on the download.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub expected_kb: u64,
    pub downloaded_kb: u64,
    /// 0.0 - 100.0
    pub percent: f64,
}
