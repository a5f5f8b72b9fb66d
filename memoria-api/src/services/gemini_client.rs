//! Gemini API client
//!
//! Files API (resumable upload + status) and `generateContent`, exposed to
//! the pipeline through [`MediaAnalysisService`].

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio_util::io::ReaderStream;

use crate::models::{AnalysisJob, JobState, MediaSource};
use crate::pipeline::{MediaAnalysisService, ServiceError, SubmitRequest};

const USER_AGENT: &str = concat!("memoria/", env!("CARGO_PKG_VERSION"));
const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini client errors
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Upload session did not return an upload URL")]
    MissingUploadUrl,

    #[error("Model returned no text: {0}")]
    EmptyResponse(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<GeminiError> for ServiceError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::NetworkError(msg) => ServiceError::NetworkError(msg),
            GeminiError::ApiError(status, body) => ServiceError::ApiError(status, body),
            GeminiError::ParseError(msg) => ServiceError::ParseError(msg),
            other @ GeminiError::InvalidApiKey => ServiceError::ApiError(401, other.to_string()),
            other @ GeminiError::MissingUploadUrl => ServiceError::ParseError(other.to_string()),
            GeminiError::EmptyResponse(msg) => ServiceError::EmptyResponse(msg),
            GeminiError::Io(msg) => ServiceError::NetworkError(msg),
        }
    }
}

/// File resource of the Files API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiFile {
    /// Resource name, e.g. "files/abc-123"
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: GeminiFile,
}

/// Map a Files API state onto the job state machine
pub fn map_file_state(state: &str) -> JobState {
    match state {
        "ACTIVE" => JobState::Ready,
        "FAILED" => JobState::Failed,
        "PROCESSING" => JobState::Processing,
        _ => JobState::Submitted,
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    File { file_data: FileData<'a> },
    Inline { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct FileData<'a> {
    file_uri: &'a str,
    mime_type: &'a str,
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

impl<'a> GenerateRequest<'a> {
    fn new(source: &'a MediaSource, prompt: &'a str) -> Self {
        let media = match source {
            MediaSource::Remote { uri, mime_type } => Part::File {
                file_data: FileData {
                    file_uri: uri,
                    mime_type,
                },
            },
            MediaSource::Inline { mime_type, data } => Part::Inline {
                inline_data: InlineData {
                    mime_type,
                    data: BASE64.encode(data),
                },
            },
        };

        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![media, Part::Text { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: GenerateResponse) -> Result<String, GeminiError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let feedback = response
            .prompt_feedback
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(GeminiError::EmptyResponse(feedback));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        return Err(GeminiError::EmptyResponse(
            candidate
                .finish_reason
                .unwrap_or_else(|| "empty candidate".to_string()),
        ));
    }
    Ok(text)
}

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, api_base: &str, timeout: Duration) -> Result<Self, GeminiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Upload a local file with the resumable upload protocol
    pub async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<GeminiFile, GeminiError> {
        let io_error = |e: std::io::Error| GeminiError::Io(format!("{}: {}", path.display(), e));
        let file = tokio::fs::File::open(path).await.map_err(io_error)?;
        let size = file.metadata().await.map_err(io_error)?.len();

        tracing::debug!(
            path = %path.display(),
            bytes = size,
            mime = %mime_type,
            "Starting Gemini file upload"
        );

        let start = self
            .http_client
            .post(format!("{}/upload/v1beta/files", self.api_base))
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        let start = check_status(start).await?;
        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(GeminiError::MissingUploadUrl)?;

        let finalize = self
            .http_client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        let uploaded: UploadResponse = check_status(finalize)
            .await?
            .json()
            .await
            .map_err(|e| GeminiError::ParseError(e.to_string()))?;

        tracing::info!(
            name = %uploaded.file.name,
            state = %uploaded.file.state,
            "Gemini file uploaded"
        );
        Ok(uploaded.file)
    }

    /// Fetch a file resource by name
    pub async fn get_file(&self, name: &str) -> Result<GeminiFile, GeminiError> {
        let response = self
            .http_client
            .get(format!("{}/v1beta/{}", self.api_base, name))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GeminiError::ParseError(e.to_string()))
    }

    /// Single (non-streaming) completion for a medium and prompt
    pub async fn generate_content(
        &self,
        model: &str,
        source: &MediaSource,
        prompt: &str,
    ) -> Result<String, GeminiError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.api_base, model);

        tracing::debug!(model = %model, mime = %source.mime_type(), "Requesting Gemini generation");

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&GenerateRequest::new(source, prompt))
            .send()
            .await
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        let body: GenerateResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GeminiError::ParseError(e.to_string()))?;

        extract_text(body)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GeminiError> {
    let status = response.status();

    // 403 is also returned for permission and region refusals, so only 401
    // is treated as a bad key.
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GeminiError::InvalidApiKey);
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(GeminiError::ApiError(status.as_u16(), error_text));
    }

    Ok(response)
}

#[async_trait]
impl MediaAnalysisService for GeminiClient {
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<AnalysisJob, ServiceError> {
        let file = self
            .upload_file(request.path, request.mime_type, request.display_name)
            .await?;

        Ok(AnalysisJob {
            state: map_file_state(&file.state),
            mime_type: if file.mime_type.is_empty() {
                request.mime_type.to_string()
            } else {
                file.mime_type
            },
            job_id: file.name,
            remote_uri: file.uri,
        })
    }

    async fn job_state(&self, job: &AnalysisJob) -> Result<JobState, ServiceError> {
        let file = self.get_file(&job.job_id).await?;
        Ok(map_file_state(&file.state))
    }

    async fn generate(
        &self,
        model: &str,
        source: &MediaSource,
        prompt: &str,
    ) -> Result<String, ServiceError> {
        Ok(self.generate_content(model, source, prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new(
            "test_key".to_string(),
            "https://generativelanguage.googleapis.com/",
            Duration::from_secs(30),
        );
        assert!(client.is_ok());
        assert_eq!(
            client.unwrap().api_base,
            "https://generativelanguage.googleapis.com"
        );
    }

    #[test]
    fn test_map_file_state() {
        assert_eq!(map_file_state("STATE_UNSPECIFIED"), JobState::Submitted);
        assert_eq!(map_file_state("PROCESSING"), JobState::Processing);
        assert_eq!(map_file_state("ACTIVE"), JobState::Ready);
        assert_eq!(map_file_state("FAILED"), JobState::Failed);
        assert_eq!(map_file_state(""), JobState::Submitted);
    }

    #[test]
    fn test_remote_request_shape() {
        let source = MediaSource::Remote {
            uri: "https://example.test/files/abc".to_string(),
            mime_type: "video/mp4".to_string(),
        };
        let json = serde_json::to_value(GenerateRequest::new(&source, "describe")).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["file_data"]["file_uri"], "https://example.test/files/abc");
        assert_eq!(parts[0]["file_data"]["mime_type"], "video/mp4");
        assert_eq!(parts[1]["text"], "describe");
    }

    #[test]
    fn test_inline_request_shape() {
        let source = MediaSource::Inline {
            mime_type: "image/jpeg".to_string(),
            data: Bytes::from_static(b"abc"),
        };
        let json = serde_json::to_value(GenerateRequest::new(&source, "describe")).unwrap();

        let inline = &json["contents"][0]["parts"][0]["inline_data"];
        assert_eq!(inline["mime_type"], "image/jpeg");
        assert_eq!(inline["data"], "YWJj");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"A dog runs. "},{"text":"||INDIVIDUALS||: Alex"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(
            extract_text(response).unwrap(),
            "A dog runs. ||INDIVIDUALS||: Alex"
        );
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(matches!(err, GeminiError::EmptyResponse(ref msg) if msg.contains("SAFETY")));
    }

    #[test]
    fn test_extract_text_empty_candidate() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#).unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(matches!(err, GeminiError::EmptyResponse(ref msg) if msg == "MAX_TOKENS"));
    }
}
