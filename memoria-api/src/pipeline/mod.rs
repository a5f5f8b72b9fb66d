//! Media analysis pipeline
//!
//! stage → submit → poll → generate (primary, then fallback) → parse → cleanup
//!
//! One linear flow per request. Images skip staging, submission and polling
//! and are inlined into the generation request. Videos are staged to disk,
//! registered with the analysis service and polled until ready. The staged
//! file is removed on every exit path.

pub mod contract;
pub mod generation;
pub mod poll;
pub mod service;
pub mod staging;

pub use contract::{parse_response, DEFAULT_PROMPT, INDIVIDUALS_MARKER};
pub use generation::ModelPair;
pub use poll::PollPolicy;
pub use service::{MediaAnalysisService, ServiceError, SubmitRequest};
pub use staging::StagedArtifact;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::models::{AnalysisResponse, GenerationResult, MediaClass, MediaSource, UploadedMedium};

/// Pipeline errors
///
/// `MissingFile` and `UnsupportedMediaType` are caller errors; everything
/// else is a fatal server-side failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No file provided")]
    MissingFile,

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Media submission failed: {0}")]
    Submission(#[source] ServiceError),

    #[error("Media status query failed: {0}")]
    StatusQuery(#[source] ServiceError),

    #[error("Media processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Media processing failed: job {job_id} not ready after {:.1}s", .waited.as_secs_f64())]
    PollTimeout { job_id: String, waited: Duration },

    #[error("Generation failed: {primary_model}: {primary}; fallback {fallback_model}: {fallback}")]
    Generation {
        primary_model: String,
        primary: ServiceError,
        fallback_model: String,
        fallback: ServiceError,
    },

    /// The pipeline task ended without producing a result
    #[error("Analysis task aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    /// Whether the caller sent something unusable (4xx) rather than the
    /// pipeline failing (5xx)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingFile | PipelineError::UnsupportedMediaType(_)
        )
    }
}

/// Pipeline parameters
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub models: ModelPair,
    /// Instruction sent with every medium; must ask for [`INDIVIDUALS_MARKER`]
    pub prompt: String,
    pub poll: PollPolicy,
    pub staging_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models: ModelPair {
                primary: "gemini-1.5-pro".to_string(),
                fallback: "gemini-1.5-flash".to_string(),
            },
            prompt: DEFAULT_PROMPT.to_string(),
            poll: PollPolicy::default(),
            staging_dir: std::env::temp_dir().join("memoria-staging"),
        }
    }
}

/// Parameterised analysis pipeline
///
/// Constructed once per process; holds no per-request state.
pub struct AnalysisPipeline {
    service: Arc<dyn MediaAnalysisService>,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    pub fn new(service: Arc<dyn MediaAnalysisService>, config: PipelineConfig) -> Self {
        Self { service, config }
    }

    /// Analyze one uploaded medium
    pub async fn run(&self, medium: UploadedMedium) -> Result<AnalysisResponse, PipelineError> {
        let class = MediaClass::from_mime(&medium.mime_type)
            .ok_or_else(|| PipelineError::UnsupportedMediaType(medium.mime_type.clone()))?;

        info!(
            file = %medium.file_name,
            mime = %medium.mime_type,
            bytes = medium.size(),
            class = ?class,
            "Starting media analysis"
        );

        let generation = match class {
            MediaClass::Image => {
                let source = MediaSource::Inline {
                    mime_type: medium.mime_type.clone(),
                    data: medium.data.clone(),
                };
                self.generate(&source).await?
            }
            MediaClass::Video => {
                let artifact =
                    StagedArtifact::stage(&self.config.staging_dir, &medium.file_name, &medium.data)
                        .await
                        .map_err(PipelineError::Staging)?;

                let outcome = self.analyze_staged(&artifact, &medium).await;
                artifact.release().await;
                outcome?
            }
        };

        let parsed = parse_response(&generation.raw_text);
        Ok(AnalysisResponse::new(parsed, &generation))
    }

    async fn analyze_staged(
        &self,
        artifact: &StagedArtifact,
        medium: &UploadedMedium,
    ) -> Result<GenerationResult, PipelineError> {
        let job = self
            .service
            .submit(SubmitRequest {
                path: artifact.path(),
                mime_type: &medium.mime_type,
                display_name: &medium.file_name,
            })
            .await
            .map_err(PipelineError::Submission)?;

        info!(job_id = %job.job_id, state = ?job.state, "Medium submitted");

        let job = poll::wait_until_ready(self.service.as_ref(), job, self.config.poll).await?;

        let source = MediaSource::Remote {
            uri: job.remote_uri,
            mime_type: job.mime_type,
        };
        self.generate(&source).await
    }

    async fn generate(&self, source: &MediaSource) -> Result<GenerationResult, PipelineError> {
        generation::generate_with_fallback(
            self.service.as_ref(),
            &self.config.models,
            source,
            &self.config.prompt,
        )
        .await
    }
}
