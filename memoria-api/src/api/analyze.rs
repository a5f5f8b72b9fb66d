//! Evidence analysis endpoint
//!
//! POST /api/analyze-evidence accepts a multipart body whose `file` part is
//! the medium to analyze. The pipeline runs on its own task so a caller that
//! disconnects mid-analysis cannot interrupt staging cleanup.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{error, warn};

use crate::models::{AnalysisResponse, UploadedMedium};
use crate::pipeline::PipelineError;
use crate::{ApiError, ApiResult, AppState};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
const DEFAULT_FILE_NAME: &str = "upload";

/// POST /api/analyze-evidence
///
/// **Response:** `{"description", "individuals", "model", "duration"}`
///
/// **Errors:**
/// - 400: no `file` part, or a type that is neither image nor video
/// - 500: staging, submission, processing or generation failure
/// - 503: no analysis service configured (checked after the `file` part)
pub async fn analyze_evidence(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<AnalysisResponse>> {
    let medium = read_medium(multipart)
        .await?
        .ok_or(PipelineError::MissingFile)?;

    let pipeline = state
        .analysis
        .clone()
        .ok_or_else(|| ApiError::Unavailable("Media analysis is not configured".to_string()))?;

    let outcome = tokio::spawn(async move { pipeline.run(medium).await })
        .await
        .unwrap_or_else(|e| Err(PipelineError::Aborted(e.to_string())));

    match outcome {
        Ok(response) => Ok(Json(response)),
        Err(e) if e.is_input_error() => {
            warn!(error = %e, "Rejected analysis request");
            Err(e.into())
        }
        Err(e) => {
            error!(error = %e, "Media analysis failed");
            *state.last_error.write().await = Some(e.to_string());
            Err(e.into())
        }
    }
}

/// First `file` part of the body; other parts are skipped
async fn read_medium(mut multipart: Multipart) -> ApiResult<Option<UploadedMedium>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let mime_type = field
            .content_type()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

        return Ok(Some(UploadedMedium {
            data,
            mime_type,
            file_name,
        }));
    }

    Ok(None)
}

/// Build analysis routes
pub fn analysis_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/analyze-evidence", post(analyze_evidence))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
