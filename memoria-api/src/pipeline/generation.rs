//! Generation with a single fallback attempt

use std::time::Instant;
use tracing::{info, warn};

use super::service::MediaAnalysisService;
use super::PipelineError;
use crate::models::{GenerationResult, MediaSource};

/// Primary model and the one fallback tried after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPair {
    pub primary: String,
    pub fallback: String,
}

/// Ask the primary model; on any error ask the fallback exactly once
///
/// Both calls get the same source and prompt. The recorded elapsed time
/// covers this step only.
pub async fn generate_with_fallback(
    service: &dyn MediaAnalysisService,
    models: &ModelPair,
    source: &MediaSource,
    prompt: &str,
) -> Result<GenerationResult, PipelineError> {
    let started = Instant::now();

    let primary_error = match service.generate(&models.primary, source, prompt).await {
        Ok(raw_text) => {
            return Ok(finish(raw_text, &models.primary, started));
        }
        Err(e) => e,
    };

    warn!(
        model = %models.primary,
        fallback = %models.fallback,
        error = %primary_error,
        "Primary model failed, retrying with fallback model"
    );

    match service.generate(&models.fallback, source, prompt).await {
        Ok(raw_text) => Ok(finish(raw_text, &models.fallback, started)),
        Err(fallback_error) => Err(PipelineError::Generation {
            primary_model: models.primary.clone(),
            primary: primary_error,
            fallback_model: models.fallback.clone(),
            fallback: fallback_error,
        }),
    }
}

fn finish(raw_text: String, model: &str, started: Instant) -> GenerationResult {
    let result = GenerationResult {
        raw_text,
        model_used: model.to_string(),
        elapsed: started.elapsed(),
    };
    info!(
        model = %result.model_used,
        elapsed_secs = result.elapsed_seconds(),
        chars = result.raw_text.len(),
        "Generation complete"
    );
    result
}
