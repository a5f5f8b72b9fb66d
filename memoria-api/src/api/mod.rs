//! HTTP API handlers for memoria-api

pub mod analyze;
pub mod clips;
pub mod geo;
pub mod health;
pub mod movies;

pub use analyze::analysis_routes;
pub use clips::clip_routes;
pub use geo::geo_routes;
pub use health::health_routes;
pub use movies::movie_routes;
