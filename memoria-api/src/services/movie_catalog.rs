//! Movie catalog interface and multi-page ranking
//!
//! Trending and filtered listings fetch several pages concurrently, merge
//! them, drop duplicate ids (first occurrence wins) and rank by normalised
//! popularity.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashSet;
use thiserror::Error;

use crate::models::{DiscoverFilter, RankedListing, ScoredMovie, TmdbMovie, TmdbPage};

const POPULARITY_WEIGHT: f64 = 0.3;
const RELEVANCE_WEIGHT: f64 = 0.7;

/// Movie catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid API credentials")]
    InvalidCredentials,
}

#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Movies first released in `year`, most popular first
    async fn discover_by_year(&self, year: i32, page: u32) -> Result<TmdbPage<TmdbMovie>, CatalogError>;

    /// Title search (first page)
    async fn search(&self, query: &str) -> Result<TmdbPage<TmdbMovie>, CatalogError>;

    /// One page of this week's trending movies
    async fn trending_page(&self, page: u32) -> Result<TmdbPage<TmdbMovie>, CatalogError>;

    /// One page of discover results for the given filters
    async fn discover_page(
        &self,
        filter: &DiscoverFilter,
        page: u32,
    ) -> Result<TmdbPage<TmdbMovie>, CatalogError>;
}

/// Trending pages `1..=pages`, merged and ranked
pub async fn trending(catalog: &dyn MovieCatalog, pages: u32) -> Result<RankedListing, CatalogError> {
    let fetches = (1..=pages).map(|page| catalog.trending_page(page));
    let pages = futures::future::try_join_all(fetches).await?;
    Ok(RankedListing {
        results: rank_movies(pages),
    })
}

/// Discover pages `1..=pages` for `filter`, merged and ranked
pub async fn filtered(
    catalog: &dyn MovieCatalog,
    filter: &DiscoverFilter,
    pages: u32,
) -> Result<RankedListing, CatalogError> {
    let fetches = (1..=pages).map(|page| catalog.discover_page(filter, page));
    let pages = futures::future::try_join_all(fetches).await?;
    Ok(RankedListing {
        results: rank_movies(pages),
    })
}

/// Merge pages, de-duplicate by id and sort by score (descending, stable)
///
/// With no search query the relevance of a movie is its normalised
/// popularity, so the score reduces to that value.
pub fn rank_movies(pages: Vec<TmdbPage<TmdbMovie>>) -> Vec<ScoredMovie> {
    let mut seen = HashSet::new();
    let unique: Vec<TmdbMovie> = pages
        .into_iter()
        .flat_map(|page| page.results)
        .filter(|movie| seen.insert(movie.id))
        .collect();

    let max_popularity = unique.iter().map(|m| m.popularity).fold(0.0, f64::max);
    let max_popularity = if max_popularity > 0.0 { max_popularity } else { 1.0 };

    let mut scored: Vec<ScoredMovie> = unique
        .into_iter()
        .map(|movie| {
            let popularity_norm = movie.popularity / max_popularity;
            let relevance = popularity_norm;
            ScoredMovie {
                score: popularity_norm * POPULARITY_WEIGHT + relevance * RELEVANCE_WEIGHT,
                movie,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}
