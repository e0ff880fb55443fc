//! Selection lifecycle integration tests.
//!
//! These tests drive the catalog side of the flow through the mock listing
//! source:
//! - Movie selection by configured index
//! - Seed count correlation over a scraped listing
//! - Torrent selection and out-of-range handling
//! - Catalog errors surfacing unchanged

use reelgrab_core::{
    correlate, select,
    testing::{fixtures, MockListingSource, RecordedCall},
    CatalogError, Config, ListingSource, MediaRecord, SelectionError, TorrentRecord,
};

/// Test helper with a mock catalog holding three movies; only the second
/// one has a torrent listing.
struct TestHarness {
    source: MockListingSource,
    movies: Vec<MediaRecord>,
}

impl TestHarness {
    async fn new() -> Self {
        let source = MockListingSource::new();
        let movies = vec![
            fixtures::media_record("Seven Samurai", 1954),
            fixtures::media_record("Ikiru", 1952),
            fixtures::media_record("Ran", 1985),
        ];
        source.set_movies(movies.clone()).await;
        source
            .set_listing(
                &movies[1].page_url,
                fixtures::torrent_listing(&[("720p", 31), ("1080p", 17), ("2160p", 0)]),
            )
            .await;

        Self { source, movies }
    }

    /// Runs the catalog half of the flow the way the binary does.
    async fn pick(&self, config: &Config) -> Result<TorrentRecord, String> {
        let movies = self
            .source
            .find_movies(&config.query)
            .await
            .map_err(|e| e.to_string())?;
        let movie =
            select(&movies, config.selection.movie_index, "movie").map_err(|e| e.to_string())?;
        let listing = self
            .source
            .torrent_listing(movie)
            .await
            .map_err(|e| e.to_string())?;
        let records = correlate(listing.candidates, &listing.seed_fragments);
        select(&records, config.selection.torrent_index, "torrent")
            .cloned()
            .map_err(|e| e.to_string())
    }
}

#[tokio::test]
async fn test_default_selection_picks_second_of_each() {
    let harness = TestHarness::new().await;

    let record = harness.pick(&Config::default()).await.unwrap();

    assert_eq!(record.quality, "1080p");
    assert_eq!(record.seeds, Some(17));

    let calls = harness.source.recorded_calls().await;
    assert_eq!(calls.len(), 2);
    match &calls[0] {
        RecordedCall::FindMovies { query, .. } => assert_eq!(query.rating, 9),
        other => panic!("expected FindMovies, got {:?}", other),
    }
    match &calls[1] {
        RecordedCall::TorrentListing { page_url, .. } => {
            assert_eq!(page_url, &harness.movies[1].page_url)
        }
        other => panic!("expected TorrentListing, got {:?}", other),
    }
}

#[tokio::test]
async fn test_zero_seed_torrent_is_selectable() {
    let harness = TestHarness::new().await;
    let mut config = Config::default();
    config.selection.torrent_index = 2;

    let record = harness.pick(&config).await.unwrap();

    assert_eq!(record.quality, "2160p");
    assert_eq!(record.seeds, Some(0));
}

#[tokio::test]
async fn test_movie_without_torrents_is_out_of_range() {
    let harness = TestHarness::new().await;
    let mut config = Config::default();
    config.selection.movie_index = 2;

    let err = harness.pick(&config).await.unwrap_err();

    assert_eq!(
        err,
        SelectionError::OutOfRange {
            what: "torrent",
            index: 1,
            len: 0
        }
        .to_string()
    );
}

#[tokio::test]
async fn test_movie_index_beyond_results() {
    let harness = TestHarness::new().await;
    let mut config = Config::default();
    config.selection.movie_index = 3;

    let err = harness.pick(&config).await.unwrap_err();

    assert_eq!(err, "No movie at index 3 (only 3 available)");
    assert_eq!(harness.source.call_count().await, 1);
}

#[tokio::test]
async fn test_catalog_error_stops_the_flow() {
    let harness = TestHarness::new().await;
    harness
        .source
        .set_next_error(CatalogError::HttpStatus {
            url: "https://yts.mx/browse-movies".to_string(),
            status: 503,
        })
        .await;

    let err = harness.pick(&Config::default()).await.unwrap_err();

    assert!(err.contains("HTTP 503"));
    assert_eq!(harness.source.call_count().await, 0);
}
