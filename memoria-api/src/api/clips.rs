//! Clip storage endpoints
//!
//! POST /api/b2/upload stores a clip under its memory's prefix,
//! GET /api/b2/sign-url hands out a temporary download URL.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::services::{clip_key, ClipStore};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUrlQuery {
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignUrlResponse {
    pub url: String,
}

struct ClipUpload {
    memory_id: String,
    data: Bytes,
    content_type: String,
}

fn clip_store(state: &AppState) -> ApiResult<Arc<dyn ClipStore>> {
    state
        .clips
        .clone()
        .ok_or_else(|| ApiError::Unavailable("Clip storage is not configured".to_string()))
}

/// POST /api/b2/upload
///
/// Multipart `file` + `memoryId`. Responds `{"key": "<memoryId>/<uuid>.mp4"}`.
pub async fn upload_clip(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let store = clip_store(&state)?;

    let upload = read_upload(multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Missing data".to_string()))?;

    let key = clip_key(&upload.memory_id)?;
    store
        .put_clip(&key, upload.data, &upload.content_type)
        .await?;

    Ok(Json(UploadResponse { key }))
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Option<ClipUpload>> {
    let mut memory_id = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("memoryId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                memory_id = Some(text).filter(|t| !t.trim().is_empty());
            }
            Some("file") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                file = Some((data, content_type));
            }
            _ => {}
        }
    }

    Ok(match (memory_id, file) {
        (Some(memory_id), Some((data, content_type))) => Some(ClipUpload {
            memory_id,
            data,
            content_type,
        }),
        _ => None,
    })
}

/// GET /api/b2/sign-url?key=...
pub async fn sign_url(
    State(state): State<AppState>,
    Query(query): Query<SignUrlQuery>,
) -> ApiResult<Json<SignUrlResponse>> {
    let store = clip_store(&state)?;

    let key = query
        .key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing key".to_string()))?;

    let url = store.signed_url(&key).await?;
    Ok(Json(SignUrlResponse { url }))
}

/// Build clip storage routes
pub fn clip_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/b2/upload",
            post(upload_clip).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/b2/sign-url", get(sign_url))
}
