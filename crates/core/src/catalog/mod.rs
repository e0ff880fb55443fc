//! Movie catalog access.
//!
//! This module provides a `ListingSource` trait for listing movies from a
//! browsable catalog and fetching each movie's raw torrent listing, plus a
//! YTS-backed implementation.

mod types;
mod yts;

pub use types::*;
pub use yts::{parse_movie_listing, parse_torrent_listing, resolve_url, YtsListingSource};
