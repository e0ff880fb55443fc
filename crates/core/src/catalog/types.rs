//! Types for the movie catalog and its raw torrent listings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder the catalog expects for an unset title filter.
const ANY_TITLE: &str = "0";
/// Placeholder for unset quality, genre and language filters.
const ANY: &str = "all";
/// Default sort order.
const LATEST: &str = "latest";
/// Placeholder for an unset year filter.
const ANY_YEAR: &str = "0";

/// Filters for a catalog browse request.
///
/// Every field is optional in practice: an empty string (or a zero rating)
/// is replaced by the catalog's "any" placeholder when the query is
/// normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Title search term.
    pub title: String,
    /// Resolution / quality filter (e.g. "1080p").
    pub quality: String,
    /// Genre filter (e.g. "horror").
    pub genre: String,
    /// Minimum rating, 0-9.
    pub rating: u8,
    /// Sort order (e.g. "latest", "rating", "seeds").
    pub order: String,
    /// Release year filter.
    pub year: String,
    /// Language code filter.
    pub language: String,
}

impl SearchQuery {
    /// Returns a copy with the catalog placeholders substituted for every
    /// field left at its zero value.
    pub fn normalized(&self) -> SearchQuery {
        fn or_default(value: &str, default: &str) -> String {
            if value.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        }

        SearchQuery {
            title: or_default(&self.title, ANY_TITLE),
            quality: or_default(&self.quality, ANY),
            genre: or_default(&self.genre, ANY),
            rating: self.rating,
            order: or_default(&self.order, LATEST),
            year: or_default(&self.year, ANY_YEAR),
            language: or_default(&self.language, ANY),
        }
    }

    /// Builds the browse URL for this query under `base_url`.
    pub fn browse_url(&self, base_url: &str) -> String {
        let q = self.normalized();
        format!(
            "{}/browse-movies/{}/{}/{}/{}/{}/{}/{}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(&q.title),
            urlencoding::encode(&q.quality),
            urlencoding::encode(&q.genre),
            q.rating,
            urlencoding::encode(&q.order),
            urlencoding::encode(&q.year),
            urlencoding::encode(&q.language),
        )
    }
}

/// A movie as listed on a catalog browse page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub title: String,
    /// Cover image URL.
    pub cover_url: String,
    /// Release year as printed; may be blank or non-numeric.
    pub year: String,
    /// Detail page URL, where the torrent listing lives.
    pub page_url: String,
}

/// A torrent link found on a detail page, before its seed count is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentCandidate {
    /// Download URL of the .torrent payload.
    pub link: String,
    /// Quality label shown on the link (e.g. "1080p.BluRay").
    pub quality: String,
}

/// A text fragment from the detail page's tech-spec block.
///
/// Some of these carry a seed count ("Seeds 42"), most are noise. They line
/// up with the torrent candidates by document order only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFragment(pub String);

impl SeedFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Both raw sequences extracted from one detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentListing {
    pub candidates: Vec<TorrentCandidate>,
    pub seed_fragments: Vec<SeedFragment>,
}

/// Errors that can occur while talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Catalog returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to read catalog response: {0}")]
    Body(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl CatalogError {
    /// Maps a transport error to the matching variant.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_connect() {
            CatalogError::ConnectionFailed(e.to_string())
        } else {
            CatalogError::Body(e.to_string())
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::Body(_) | Self::Client(_) => false,
        }
    }
}

/// Trait for catalog backends that list movies and their torrents.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Lists the movies matching `query`, in page order.
    async fn find_movies(&self, query: &SearchQuery) -> Result<Vec<MediaRecord>, CatalogError>;

    /// Fetches the raw torrent candidates and seed fragments for `movie`.
    async fn torrent_listing(&self, movie: &MediaRecord) -> Result<TorrentListing, CatalogError>;
}
