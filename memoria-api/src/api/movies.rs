//! Movie catalog endpoints

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::models::{DiscoverFilter, RankedListing, YearListing, YearMovie};
use crate::services::{movie_catalog, MovieCatalog};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

fn catalog(state: &AppState) -> ApiResult<Arc<dyn MovieCatalog>> {
    state
        .movies
        .clone()
        .ok_or_else(|| ApiError::Unavailable("Movie catalog is not configured".to_string()))
}

/// Parse the year listing parameters: `(year, page)`
fn parse_year_query(query: &YearQuery) -> ApiResult<(i32, u32)> {
    let year = query
        .year
        .as_deref()
        .map(str::trim)
        .filter(|y| !y.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Year parameter is required".to_string()))?;
    let year = year
        .parse::<i32>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid year parameter: {}", year)))?;

    let page = match query.page.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        None => 1,
        Some(page) => page
            .parse::<u32>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid page parameter: {}", page)))?,
    };

    Ok((year, page))
}

/// GET /api/tmdb-proxy?year=Y&page=P
///
/// Movies first released in `year`, most popular first.
pub async fn movies_by_year(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> ApiResult<Json<YearListing>> {
    let (year, page) = parse_year_query(&query)?;
    let catalog = catalog(&state)?;

    let listing = catalog
        .discover_by_year(year, page)
        .await
        .map_err(|e| {
            tracing::error!(year, page, error = %e, "TMDB discover failed");
            ApiError::Upstream {
                message: "Failed to fetch movies from TMDB".to_string(),
                details: e.to_string(),
            }
        })?;

    Ok(Json(YearListing {
        results: listing
            .results
            .iter()
            .map(|movie| YearMovie::from_movie(movie, year))
            .collect(),
        page: listing.page,
        total_pages: listing.total_pages,
        total_results: listing.total_results,
    }))
}

/// GET /api/tmdb/search?query=Q
pub async fn search_movies(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Response> {
    let Some(text) = query.query.filter(|q| !q.trim().is_empty()) else {
        return Ok(Json(json!({ "results": [] })).into_response());
    };

    let page = catalog(&state)?.search(&text).await?;
    Ok(Json(page).into_response())
}

/// GET /api/tmdb/trending
pub async fn trending_movies(State(state): State<AppState>) -> ApiResult<Json<RankedListing>> {
    let catalog = catalog(&state)?;
    let listing = movie_catalog::trending(catalog.as_ref(), state.tmdb_pages).await?;
    Ok(Json(listing))
}

/// GET /api/tmdb/filter?year&region&languages
pub async fn filter_movies(
    State(state): State<AppState>,
    Query(filter): Query<DiscoverFilter>,
) -> ApiResult<Json<RankedListing>> {
    let catalog = catalog(&state)?;
    let listing = movie_catalog::filtered(catalog.as_ref(), &filter, state.tmdb_pages).await?;
    Ok(Json(listing))
}

/// Build movie catalog routes
pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tmdb-proxy", get(movies_by_year))
        .route("/api/tmdb/search", get(search_movies))
        .route("/api/tmdb/trending", get(trending_movies))
        .route("/api/tmdb/filter", get(filter_movies))
}
