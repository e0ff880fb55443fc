//! YTS catalog backend: browse pages for movies, detail pages for torrents.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::CatalogConfig;

use super::{
    CatalogError, ListingSource, MediaRecord, SearchQuery, SeedFragment, TorrentCandidate,
    TorrentListing,
};

static MOVIE_WRAP: Lazy<Selector> = Lazy::new(|| Selector::parse("div.browse-movie-wrap").unwrap());
static MOVIE_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("a.browse-movie-title").unwrap());
static MOVIE_YEAR: Lazy<Selector> = Lazy::new(|| Selector::parse("div.browse-movie-year").unwrap());
static MOVIE_COVER: Lazy<Selector> = Lazy::new(|| Selector::parse("img.img-responsive").unwrap());
static TORRENT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"p.hidden-xs a[rel="nofollow"]"#).unwrap());
static TECH_SPEC: Lazy<Selector> = Lazy::new(|| Selector::parse("div.tech-spec-element").unwrap());

/// Catalog backend that scrapes the YTS website.
pub struct YtsListingSource {
    client: Client,
    base_url: String,
}

impl YtsListingSource {
    /// Create a new source with the given configuration.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CatalogError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a page and return its body as text.
    async fn get_document(&self, url: &str) -> Result<String, CatalogError> {
        info!(url = url, "Requesting");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?;

        let status = response.status();
        info!(url = url, status = status.as_u16(), "Response");

        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(CatalogError::from_reqwest)
    }
}

#[async_trait]
impl ListingSource for YtsListingSource {
    fn name(&self) -> &str {
        "yts"
    }

    async fn find_movies(&self, query: &SearchQuery) -> Result<Vec<MediaRecord>, CatalogError> {
        let url = query.browse_url(&self.base_url);
        let html = self.get_document(&url).await?;
        let movies = parse_movie_listing(&html, &self.base_url);
        debug!(results = movies.len(), "Movie listing parsed");
        Ok(movies)
    }

    async fn torrent_listing(&self, movie: &MediaRecord) -> Result<TorrentListing, CatalogError> {
        let url = resolve_url(&self.base_url, &movie.page_url);
        let html = self.get_document(&url).await?;
        let listing = parse_torrent_listing(&html, &self.base_url);
        debug!(
            title = %movie.title,
            candidates = listing.candidates.len(),
            fragments = listing.seed_fragments.len(),
            "Torrent listing parsed"
        );
        Ok(listing)
    }
}

/// Extract the movies from a browse page.
///
/// Every `div.browse-movie-wrap` yields one record; nodes missing inside a
/// wrap leave the matching field empty.
pub fn parse_movie_listing(html: &str, base_url: &str) -> Vec<MediaRecord> {
    let doc = Html::parse_document(html);

    doc.select(&MOVIE_WRAP)
        .map(|wrap| {
            let mut movie = MediaRecord::default();

            if let Some(a) = wrap.select(&MOVIE_TITLE).next() {
                movie.title = element_text(a);
                movie.page_url = a
                    .value()
                    .attr("href")
                    .map(|href| resolve_url(base_url, href))
                    .unwrap_or_default();
            }

            if let Some(year) = wrap.select(&MOVIE_YEAR).next() {
                movie.year = element_text(year);
            }

            if let Some(img) = wrap.select(&MOVIE_COVER).next() {
                movie.cover_url = img
                    .value()
                    .attr("src")
                    .map(|src| resolve_url(base_url, src))
                    .unwrap_or_default();
            }

            movie
        })
        .collect()
}

/// Extract torrent candidates and seed fragments from a detail page.
///
/// Candidates are the `rel="nofollow"` links inside `p.hidden-xs`; fragments
/// are the texts of every `div.tech-spec-element`. The two lists are
/// returned as found, without any pairing.
pub fn parse_torrent_listing(html: &str, base_url: &str) -> TorrentListing {
    let doc = Html::parse_document(html);

    let candidates = doc
        .select(&TORRENT_LINK)
        .map(|a| TorrentCandidate {
            link: a
                .value()
                .attr("href")
                .map(|href| resolve_url(base_url, href))
                .unwrap_or_default(),
            quality: element_text(a),
        })
        .collect();

    let seed_fragments = doc
        .select(&TECH_SPEC)
        .map(|div| SeedFragment::new(element_text(div)))
        .collect();

    TorrentListing {
        candidates,
        seed_fragments,
    }
}

/// Text content of an element with whitespace runs collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a possibly relative link against the catalog root.
pub fn resolve_url(base_url: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") || href.is_empty() {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), href)
    }
}
