//! External service clients for memoria-api
//!
//! - Gemini (media analysis: file upload, status, content generation)
//! - TMDB (movie catalog)
//! - S3-compatible object storage (clip uploads, presigned URLs)
//! - Public IP / IP geolocation

pub mod clip_storage;
pub mod gemini_client;
pub mod geo_locator;
pub mod movie_catalog;
pub mod tmdb_client;

pub use clip_storage::{clip_key, ClipStore, S3ClipStore, S3Config, StorageError};
pub use gemini_client::{GeminiClient, GeminiError};
pub use geo_locator::{EdgeHints, GeoError, GeoLocator, HttpGeoLocator};
pub use movie_catalog::{CatalogError, MovieCatalog};
pub use tmdb_client::{TmdbAuth, TmdbClient};
