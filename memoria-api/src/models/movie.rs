//! Movie catalog listings

use serde::{Deserialize, Serialize};

/// Movie as returned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

/// One page of a catalog listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbPage<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> TmdbPage<T> {
    pub fn empty() -> Self {
        Self {
            page: 1,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }
}

/// Movie entry of the release-year listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMovie {
    pub id: u64,
    pub title: String,
    pub year: i32,
    /// Vote average rounded to one decimal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
}

impl YearMovie {
    pub fn from_movie(movie: &TmdbMovie, year: i32) -> Self {
        let popularity = movie
            .vote_average
            .filter(|v| *v != 0.0)
            .map(|v| (v * 10.0).round() / 10.0);

        Self {
            id: movie.id,
            title: movie.title.clone(),
            year,
            popularity,
        }
    }
}

/// GET /api/tmdb-proxy response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearListing {
    pub results: Vec<YearMovie>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
}

/// Movie with its ranking score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMovie {
    #[serde(flatten)]
    pub movie: TmdbMovie,
    #[serde(rename = "__score")]
    pub score: f64,
}

/// Ranked multi-page listing (trending, filter)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedListing {
    pub results: Vec<ScoredMovie>,
}

/// Optional discover filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DiscoverFilter {
    pub year: Option<String>,
    pub region: Option<String>,
    /// Comma separated language codes, e.g. "en,fr"
    pub languages: Option<String>,
}

impl DiscoverFilter {
    /// Query parameters for the discover endpoint (blank values skipped)
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let fields = [
            ("primary_release_year", &self.year),
            ("region", &self.region),
            ("with_original_language", &self.languages),
        ];
        for (name, value) in fields {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((name, value.to_string()));
            }
        }
        pairs
    }
}
