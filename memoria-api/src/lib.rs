//! memoria-api library interface
//!
//! Exposes the router, state and pipeline for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::pipeline::AnalysisPipeline;
use crate::services::{ClipStore, GeoLocator, MovieCatalog};

/// Default request body limit for upload routes (512 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Application state shared across handlers
///
/// Services that are not configured stay `None`; their routes answer 503.
#[derive(Clone)]
pub struct AppState {
    /// Media analysis pipeline
    pub analysis: Option<Arc<AnalysisPipeline>>,
    /// Clip object storage
    pub clips: Option<Arc<dyn ClipStore>>,
    /// Movie catalog
    pub movies: Option<Arc<dyn MovieCatalog>>,
    /// Public IP / geolocation lookups
    pub geo: Arc<dyn GeoLocator>,
    /// Pages merged by the trending and filter listings
    pub tmdb_pages: u32,
    /// Request body limit for upload routes
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last fatal analysis error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(geo: Arc<dyn GeoLocator>) -> Self {
        Self {
            analysis: None,
            clips: None,
            movies: None,
            geo,
            tmdb_pages: 5,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_analysis(mut self, pipeline: Arc<AnalysisPipeline>) -> Self {
        self.analysis = Some(pipeline);
        self
    }

    pub fn with_clips(mut self, store: Arc<dyn ClipStore>) -> Self {
        self.clips = Some(store);
        self
    }

    pub fn with_movies(mut self, catalog: Arc<dyn MovieCatalog>, pages: u32) -> Self {
        self.movies = Some(catalog);
        self.tmdb_pages = pages.max(1);
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.max_upload_bytes;

    Router::new()
        .merge(api::analysis_routes(upload_limit))
        .merge(api::clip_routes(upload_limit))
        .merge(api::movie_routes())
        .merge(api::geo_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
