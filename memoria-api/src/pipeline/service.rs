//! Capability interface of the remote analysis service
//!
//! The pipeline only talks to this trait; the concrete SDK/HTTP shape lives
//! in an adapter (see `services::gemini_client`).

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AnalysisJob, JobState, MediaSource};

/// Analysis service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Service accepted the call but returned nothing usable
    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

/// Staged medium as presented to `submit`
#[derive(Debug, Clone, Copy)]
pub struct SubmitRequest<'a> {
    pub path: &'a std::path::Path,
    pub mime_type: &'a str,
    pub display_name: &'a str,
}

#[async_trait]
pub trait MediaAnalysisService: Send + Sync {
    /// Register a staged medium and obtain a job handle
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<AnalysisJob, ServiceError>;

    /// Query the current state of a job
    async fn job_state(&self, job: &AnalysisJob) -> Result<JobState, ServiceError>;

    /// Single text completion for a medium and prompt
    async fn generate(
        &self,
        model: &str,
        source: &MediaSource,
        prompt: &str,
    ) -> Result<String, ServiceError>;
}
