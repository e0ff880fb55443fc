//! Pairing of torrent candidates with their seed counts.
//!
//! A detail page lists the torrent links in one place and the seed counts
//! in another, with nothing linking the two except document order. The
//! correlator walks both lists and hands out seed counts positionally.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{SeedFragment, TorrentCandidate};

/// Label that prefixes a seed-count fragment.
const SEEDS_LABEL: &str = "Seeds";

/// Shortest fragment (whitespace removed) worth looking at.
const MIN_FRAGMENT_LEN: usize = 5;

/// A torrent candidate enriched with its seed count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentRecord {
    pub link: String,
    pub quality: String,
    /// `None` until a seed fragment has been assigned; `Some(0)` is a real
    /// zero-seed reading.
    pub seeds: Option<u32>,
}

impl From<TorrentCandidate> for TorrentRecord {
    fn from(candidate: TorrentCandidate) -> Self {
        Self {
            link: candidate.link,
            quality: candidate.quality,
            seeds: None,
        }
    }
}

/// Outcome of looking at a single seed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentReading {
    /// A well-formed seed count.
    Seeds(u32),
    /// Too short or without the seeds label: not a seed fragment at all.
    Noise,
    /// Labelled as seeds but the count does not parse.
    Malformed(String),
}

/// Classify one raw fragment.
pub fn read_fragment(fragment: &SeedFragment) -> FragmentReading {
    let compact: String = fragment
        .as_str()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if compact.chars().count() < MIN_FRAGMENT_LEN {
        return FragmentReading::Noise;
    }

    let Some(count) = compact.strip_prefix(SEEDS_LABEL) else {
        return FragmentReading::Noise;
    };

    match count.parse::<u32>() {
        Ok(seeds) => FragmentReading::Seeds(seeds),
        Err(_) => FragmentReading::Malformed(count.to_string()),
    }
}

/// Merge candidates and seed fragments into torrent records.
///
/// The i-th valid fragment goes to the i-th record. The output always has
/// one record per candidate, in candidate order; records left over when
/// the fragments run out keep `seeds: None`. Surplus fragments are ignored.
pub fn correlate(
    candidates: Vec<TorrentCandidate>,
    fragments: &[SeedFragment],
) -> Vec<TorrentRecord> {
    let mut records: Vec<TorrentRecord> = candidates.into_iter().map(TorrentRecord::from).collect();
    let mut processed = 0usize;

    for fragment in fragments {
        if processed >= records.len() {
            break;
        }

        let seeds = match read_fragment(fragment) {
            FragmentReading::Seeds(seeds) => seeds,
            FragmentReading::Noise => continue,
            FragmentReading::Malformed(raw) => {
                warn!(fragment = %fragment.as_str(), count = %raw, "Unparseable seed count");
                continue;
            }
        };

        let record = &mut records[processed];
        if record.seeds.is_some() {
            continue;
        }

        record.seeds = Some(seeds);
        processed += 1;
    }

    debug!(
        records = records.len(),
        assigned = processed,
        fragments = fragments.len(),
        "Seed counts correlated"
    );

    records
}
