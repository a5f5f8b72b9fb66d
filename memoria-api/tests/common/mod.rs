//! Fake service implementations shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Bytes;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use memoria_api::models::{AnalysisJob, DiscoverFilter, IpLocation, JobState, MediaSource, TmdbMovie, TmdbPage};
use memoria_api::pipeline::{MediaAnalysisService, ServiceError, SubmitRequest};
use memoria_api::services::{
    CatalogError, ClipStore, GeoError, GeoLocator, MovieCatalog, StorageError,
};
use memoria_api::services::clip_storage::StorageResult;

/// Scripted analysis service
///
/// `job_state` pops scripted states in order and keeps answering the last
/// one once the script runs out. Generation answers per model.
pub struct FakeAnalysisService {
    initial_state: JobState,
    submit_fails: bool,
    registered_mime: Option<String>,
    states: Mutex<VecDeque<Result<JobState, String>>>,
    last_state: Mutex<JobState>,
    replies: HashMap<String, Result<String, String>>,
    pub calls: Mutex<Vec<String>>,
    /// Staged path seen by `submit` and whether it existed at that moment
    pub submitted: Mutex<Option<(PathBuf, bool)>>,
    pub sources: Mutex<Vec<MediaSource>>,
}

impl FakeAnalysisService {
    pub fn new(initial_state: JobState) -> Self {
        Self {
            initial_state,
            submit_fails: false,
            registered_mime: None,
            states: Mutex::new(VecDeque::new()),
            last_state: Mutex::new(initial_state),
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(None),
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn with_states(self, states: &[JobState]) -> Self {
        self.states
            .lock()
            .unwrap()
            .extend(states.iter().copied().map(Ok));
        self
    }

    pub fn with_state_error(self, message: &str) -> Self {
        self.states.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn with_reply(mut self, model: &str, reply: Result<&str, &str>) -> Self {
        self.replies.insert(
            model.to_string(),
            reply.map(str::to_string).map_err(str::to_string),
        );
        self
    }

    /// MIME type the service reports for submitted media
    pub fn with_registered_mime(mut self, mime_type: &str) -> Self {
        self.registered_mime = Some(mime_type.to_string());
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.submit_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait]
impl MediaAnalysisService for FakeAnalysisService {
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<AnalysisJob, ServiceError> {
        self.calls.lock().unwrap().push("submit".to_string());
        *self.submitted.lock().unwrap() =
            Some((request.path.to_path_buf(), request.path.exists()));

        if self.submit_fails {
            return Err(ServiceError::ApiError(500, "upload rejected".to_string()));
        }

        Ok(AnalysisJob {
            job_id: "files/fake-1".to_string(),
            state: self.initial_state,
            remote_uri: "https://files.example/fake-1".to_string(),
            mime_type: self
                .registered_mime
                .clone()
                .unwrap_or_else(|| request.mime_type.to_string()),
        })
    }

    async fn job_state(&self, _job: &AnalysisJob) -> Result<JobState, ServiceError> {
        self.calls.lock().unwrap().push("job_state".to_string());
        let next = self.states.lock().unwrap().pop_front();
        match next {
            Some(Ok(state)) => {
                *self.last_state.lock().unwrap() = state;
                Ok(state)
            }
            Some(Err(message)) => Err(ServiceError::NetworkError(message)),
            None => Ok(*self.last_state.lock().unwrap()),
        }
    }

    async fn generate(
        &self,
        model: &str,
        source: &MediaSource,
        _prompt: &str,
    ) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push(format!("generate:{}", model));
        self.sources.lock().unwrap().push(source.clone());
        match self.replies.get(model) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(ServiceError::ApiError(503, message.clone())),
            None => Err(ServiceError::ApiError(404, format!("unknown model {}", model))),
        }
    }
}

pub fn movie(id: u64, title: &str, popularity: f64, vote_average: Option<f64>) -> TmdbMovie {
    TmdbMovie {
        id,
        title: title.to_string(),
        poster_path: None,
        release_date: None,
        overview: String::new(),
        original_language: "en".to_string(),
        popularity,
        vote_average,
    }
}

pub fn page(results: Vec<TmdbMovie>) -> TmdbPage<TmdbMovie> {
    TmdbPage {
        page: 1,
        total_pages: 1,
        total_results: results.len() as u32,
        results,
    }
}

/// Catalog answering every listing with fixed pages
#[derive(Default)]
pub struct FakeCatalog {
    pub pages: Vec<TmdbPage<TmdbMovie>>,
    pub fail: bool,
    pub requests: Mutex<Vec<String>>,
}

impl FakeCatalog {
    fn answer(&self, request: String, page: u32) -> Result<TmdbPage<TmdbMovie>, CatalogError> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            return Err(CatalogError::ApiError(500, "upstream down".to_string()));
        }
        Ok(self
            .pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_else(TmdbPage::empty))
    }
}

#[async_trait]
impl MovieCatalog for FakeCatalog {
    async fn discover_by_year(&self, year: i32, page: u32) -> Result<TmdbPage<TmdbMovie>, CatalogError> {
        self.answer(format!("year:{}:{}", year, page), page)
    }

    async fn search(&self, query: &str) -> Result<TmdbPage<TmdbMovie>, CatalogError> {
        self.answer(format!("search:{}", query), 1)
    }

    async fn trending_page(&self, page: u32) -> Result<TmdbPage<TmdbMovie>, CatalogError> {
        self.answer(format!("trending:{}", page), page)
    }

    async fn discover_page(
        &self,
        filter: &DiscoverFilter,
        page: u32,
    ) -> Result<TmdbPage<TmdbMovie>, CatalogError> {
        self.answer(format!("discover:{:?}:{}", filter.query_pairs(), page), page)
    }
}

/// In-memory clip store
#[derive(Default)]
pub struct MemoryClipStore {
    pub objects: Mutex<HashMap<String, (Bytes, String)>>,
}

#[async_trait]
impl ClipStore for MemoryClipStore {
    async fn put_clip(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn signed_url(&self, key: &str) -> StorageResult<String> {
        if key.contains(' ') {
            return Err(StorageError::S3Error("bad key".to_string()));
        }
        Ok(format!("https://storage.example/{}?X-Amz-Expires=7200", key))
    }
}

/// Geo locator with fixed answers
pub struct FakeGeo {
    pub ip: Option<String>,
    pub fail: bool,
}

impl FakeGeo {
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self { ip: None, fail: true })
    }
}

#[async_trait]
impl GeoLocator for FakeGeo {
    async fn public_ip(&self) -> Result<Option<String>, GeoError> {
        if self.fail {
            return Err(GeoError::NetworkError("offline".to_string()));
        }
        Ok(self.ip.clone())
    }

    async fn locate(&self, _ip: &str) -> Result<IpLocation, GeoError> {
        Ok(IpLocation {
            country: Some("BR".to_string()),
            country_name: Some("Brazil".to_string()),
            city: Some("Recife".to_string()),
            region: None,
        })
    }
}

/// Multipart body with the given parts: `(name, filename, content type, bytes)`
pub fn multipart_body(parts: &[(&str, Option<&str>, Option<&str>, &[u8])]) -> (String, Vec<u8>) {
    let boundary = "memoria-test-boundary";
    let mut body = Vec::new();
    for (name, file_name, content_type, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", name);
        if let Some(file_name) = file_name {
            disposition.push_str(&format!("; filename=\"{}\"", file_name));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}
