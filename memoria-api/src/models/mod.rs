//! Data models for memoria-api
//!
//! - Media analysis request/job/result entities (request-scoped only)
//! - Movie catalog listings
//! - Geo lookup responses

pub mod analysis;
pub mod geo;
pub mod movie;

pub use analysis::{
    AnalysisJob, AnalysisResponse, GenerationResult, JobState, MediaClass, MediaSource,
    ParsedOutput, UploadedMedium,
};
pub use geo::{GeoLookupResponse, GeoMode, IpLocation, IpResponse};
pub use movie::{DiscoverFilter, RankedListing, ScoredMovie, TmdbMovie, TmdbPage, YearListing, YearMovie};
