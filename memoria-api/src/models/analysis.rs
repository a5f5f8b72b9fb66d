//! Media analysis entities
//!
//! Everything here lives for a single request. At most one job and one
//! generation result exist per request.

use axum::body::Bytes;
use serde::Serialize;
use std::time::Duration;

/// Binary medium received by the ingress handler
#[derive(Debug, Clone)]
pub struct UploadedMedium {
    pub data: Bytes,
    /// Declared MIME type from the multipart part
    pub mime_type: String,
    /// Original filename as sent by the client
    pub file_name: String,
}

impl UploadedMedium {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Submission path chosen from the MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    /// Inlined into the generation request, no remote job
    Image,
    /// Uploaded as a remote job and polled until ready
    Video,
}

impl MediaClass {
    /// Classify a MIME type; `None` when it is neither image- nor video-like
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        let (top, sub) = essence.split_once('/')?;
        if sub.is_empty() {
            return None;
        }
        if top.eq_ignore_ascii_case("image") {
            Some(MediaClass::Image)
        } else if top.eq_ignore_ascii_case("video") {
            Some(MediaClass::Video)
        } else {
            None
        }
    }
}

/// Remote processing state of a submitted medium
///
/// SUBMITTED → PROCESSING → READY | FAILED. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Processing,
    Ready,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Ready | JobState::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobState::Submitted => 0,
            JobState::Processing => 1,
            JobState::Ready | JobState::Failed => 2,
        }
    }

    /// Apply an observed state, ignoring reports that would move backwards
    pub fn advance(self, observed: JobState) -> JobState {
        if self.is_terminal() || observed.rank() < self.rank() {
            self
        } else {
            observed
        }
    }
}

/// Handle for a medium registered with the analysis service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    /// Opaque job identifier (e.g. "files/abc123")
    pub job_id: String,
    pub state: JobState,
    /// URI the generator uses to reference the medium
    pub remote_uri: String,
    /// MIME type the service registered; referenced by generation requests
    pub mime_type: String,
}

/// Medium reference handed to the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Inline { mime_type: String, data: Bytes },
    Remote { uri: String, mime_type: String },
}

impl MediaSource {
    pub fn mime_type(&self) -> &str {
        match self {
            MediaSource::Inline { mime_type, .. } | MediaSource::Remote { mime_type, .. } => {
                mime_type
            }
        }
    }
}

/// Raw generator output
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub raw_text: String,
    /// Model that actually produced `raw_text`
    pub model_used: String,
    /// Time spent in the generation step only
    pub elapsed: Duration,
}

impl GenerationResult {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Description/individuals split of the generator output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutput {
    pub description: String,
    pub individuals: String,
}

/// Success body of POST /api/analyze-evidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    pub description: String,
    pub individuals: String,
    pub model: String,
    /// Generation seconds with two decimals, e.g. "3.14"
    pub duration: String,
}

impl AnalysisResponse {
    pub fn new(parsed: ParsedOutput, generation: &GenerationResult) -> Self {
        Self {
            description: parsed.description,
            individuals: parsed.individuals,
            model: generation.model_used.clone(),
            duration: format!("{:.2}", generation.elapsed_seconds()),
        }
    }
}
