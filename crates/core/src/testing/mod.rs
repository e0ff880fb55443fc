//! Testing utilities and mock implementations.
//!
//! `MockListingSource` stands in for the catalog so the correlation and
//! selection steps can be exercised without network access. The launcher is
//! tested against a local HTTP server and a scripted tool instead.

mod mock_listing_source;

pub use mock_listing_source::{MockListingSource, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{MediaRecord, SeedFragment, TorrentCandidate, TorrentListing};

    /// Create a test movie with a detail page under yts.mx.
    pub fn media_record(title: &str, year: u32) -> MediaRecord {
        let slug = format!("{}-{}", title.to_lowercase().replace(' ', "-"), year);
        MediaRecord {
            title: title.to_string(),
            cover_url: format!("https://yts.mx/assets/images/movies/{}/medium-cover.jpg", slug),
            year: year.to_string(),
            page_url: format!("https://yts.mx/movies/{}", slug),
        }
    }

    /// Create a test torrent candidate for the given quality.
    pub fn torrent_candidate(quality: &str) -> TorrentCandidate {
        TorrentCandidate {
            link: format!("https://yts.mx/torrent/download/{}", quality.to_uppercase()),
            quality: quality.to_string(),
        }
    }

    /// Create a detail-page listing with one candidate per `(quality, seeds)`
    /// pair. Each seed fragment is preceded by a noise fragment, the way the
    /// tech-spec block interleaves sizes and seed counts.
    pub fn torrent_listing(torrents: &[(&str, u32)]) -> TorrentListing {
        TorrentListing {
            candidates: torrents
                .iter()
                .map(|(quality, _)| torrent_candidate(quality))
                .collect(),
            seed_fragments: torrents
                .iter()
                .flat_map(|(_, seeds)| {
                    [
                        SeedFragment::new("1.02 GB"),
                        SeedFragment::new(format!("Seeds {}", seeds)),
                    ]
                })
                .collect(),
        }
    }
}
