//! TMDB API client

use async_trait::async_trait;
use std::time::Duration;

use super::movie_catalog::{CatalogError, MovieCatalog};
use crate::models::{DiscoverFilter, TmdbMovie, TmdbPage};

const USER_AGENT: &str = concat!("memoria/", env!("CARGO_PKG_VERSION"));

/// TMDB credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TmdbAuth {
    /// v4 read access token, sent as `Authorization: Bearer`
    Bearer(String),
    /// v3 api key, sent as the `api_key` query parameter
    ApiKey(String),
}

/// TMDB API client
pub struct TmdbClient {
    http_client: reqwest::Client,
    api_base: String,
    auth: TmdbAuth,
}

impl TmdbClient {
    pub fn new(auth: TmdbAuth, api_base: &str) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            auth,
        })
    }

    async fn get_page(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<TmdbPage<TmdbMovie>, CatalogError> {
        let url = format!("{}{}", self.api_base, path);
        tracing::debug!(url = %url, params = query.len(), "Querying TMDB API");

        let mut request = self
            .http_client
            .get(&url)
            .header("Accept", "application/json")
            .query(query);

        request = match &self.auth {
            TmdbAuth::Bearer(token) => request.bearer_auth(token),
            TmdbAuth::ApiKey(key) => request.query(&[("api_key", key)]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 {
            return Err(CatalogError::InvalidCredentials);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }
}

/// Query for the release-year discover listing
fn year_query(year: i32, page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("primary_release_year", year.to_string()),
        ("sort_by", "popularity.desc".to_string()),
        ("page", page.to_string()),
        ("language", "en-US".to_string()),
    ]
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn discover_by_year(&self, year: i32, page: u32) -> Result<TmdbPage<TmdbMovie>, CatalogError> {
        self.get_page("/discover/movie", &year_query(year, page)).await
    }

    async fn search(&self, query: &str) -> Result<TmdbPage<TmdbMovie>, CatalogError> {
        self.get_page("/search/movie", &[("query", query.to_string())])
            .await
    }

    async fn trending_page(&self, page: u32) -> Result<TmdbPage<TmdbMovie>, CatalogError> {
        self.get_page("/trending/movie/week", &[("page", page.to_string())])
            .await
    }

    async fn discover_page(
        &self,
        filter: &DiscoverFilter,
        page: u32,
    ) -> Result<TmdbPage<TmdbMovie>, CatalogError> {
        let mut query = filter.query_pairs();
        query.push(("page", page.to_string()));
        self.get_page("/discover/movie", &query).await
    }
}
