//! Mock listing source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, ListingSource, MediaRecord, SearchQuery, TorrentListing};

/// A recorded catalog call for test assertions.
#[derive(Debug, Clone)]
pub enum RecordedCall {
    FindMovies {
        query: SearchQuery,
        timestamp: Instant,
    },
    TorrentListing {
        page_url: String,
        timestamp: Instant,
    },
}

/// Mock implementation of the ListingSource trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable movie lists and per-page torrent listings
/// - Track calls for assertions
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// use reelgrab_core::testing::{fixtures, MockListingSource};
///
/// let source = MockListingSource::new();
/// source.set_movies(vec![fixtures::media_record("Alien", 1979)]).await;
///
/// let movies = source.find_movies(&SearchQuery::default()).await?;
/// assert_eq!(movies.len(), 1);
/// assert_eq!(source.call_count().await, 1);
/// ```
pub struct MockListingSource {
    /// Movies returned by every `find_movies` call.
    movies: Arc<RwLock<Vec<MediaRecord>>>,
    /// Torrent listings keyed by detail page URL.
    listings: Arc<RwLock<HashMap<String, TorrentListing>>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl std::fmt::Debug for MockListingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockListingSource")
            .field("movies", &"<movies>")
            .field("listings", &"<listings>")
            .field("calls", &"<calls>")
            .field("next_error", &"<next_error>")
            .finish()
    }
}

impl Default for MockListingSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockListingSource {
    /// Create a new mock source with no movies.
    pub fn new() -> Self {
        Self {
            movies: Arc::new(RwLock::new(Vec::new())),
            listings: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the movies returned by subsequent searches.
    pub async fn set_movies(&self, movies: Vec<MediaRecord>) {
        *self.movies.write().await = movies;
    }

    /// Set the torrent listing served for a detail page.
    pub async fn set_listing(&self, page_url: &str, listing: TorrentListing) {
        self.listings
            .write()
            .await
            .insert(page_url.to_string(), listing);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    async fn take_error(&self) -> Option<CatalogError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl ListingSource for MockListingSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn find_movies(&self, query: &SearchQuery) -> Result<Vec<MediaRecord>, CatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.calls.write().await.push(RecordedCall::FindMovies {
            query: query.clone(),
            timestamp: Instant::now(),
        });

        Ok(self.movies.read().await.clone())
    }

    async fn torrent_listing(&self, movie: &MediaRecord) -> Result<TorrentListing, CatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.calls.write().await.push(RecordedCall::TorrentListing {
            page_url: movie.page_url.clone(),
            timestamp: Instant::now(),
        });

        // Unknown pages behave like a detail page without torrents.
        Ok(self
            .listings
            .read()
            .await
            .get(&movie.page_url)
            .cloned()
            .unwrap_or_default())
    }
}
