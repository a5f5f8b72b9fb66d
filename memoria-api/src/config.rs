//! Configuration resolution for memoria-api
//!
//! Turns the bootstrap TOML plus environment into the typed settings each
//! service client needs. Secrets follow ENV → TOML priority.

use memoria_common::config::{resolve_secret, AnalysisSection, TomlConfig};
use memoria_common::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::pipeline::contract::prompt_requests_marker;
use crate::pipeline::{ModelPair, PipelineConfig, PollPolicy, DEFAULT_PROMPT};
use crate::services::{S3Config, TmdbAuth};

const DEFAULT_STORAGE_REGION: &str = "us-east-1";

/// Filter used when neither `RUST_LOG` nor `[logging] level` is set
pub const DEFAULT_LOG_FILTER: &str = "memoria_api=info,tower_http=info";

/// Log filter directive from the TOML `[logging] level`, else the default
///
/// `RUST_LOG` is checked by the caller before this.
pub fn log_filter(config: Option<&TomlConfig>) -> &str {
    config
        .and_then(|c| c.logging.level.as_deref())
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER)
}

/// Gemini API key (`GOOGLE_API_KEY`, then `[gemini] api_key`)
pub fn resolve_gemini_api_key(config: &TomlConfig) -> Option<String> {
    resolve_secret("GOOGLE_API_KEY", config.gemini.api_key.as_deref())
}

/// TMDB credentials; a bearer token wins over a v3 api key
pub fn resolve_tmdb_auth(config: &TomlConfig) -> Option<TmdbAuth> {
    if let Some(token) = resolve_secret("TMDB_TOKEN", config.tmdb.token.as_deref()) {
        return Some(TmdbAuth::Bearer(token));
    }
    resolve_secret("TMDB_API_KEY", config.tmdb.api_key.as_deref()).map(TmdbAuth::ApiKey)
}

/// Object storage settings
///
/// `Ok(None)` when nothing is configured. A partial configuration (some of
/// bucket, key id, app key missing) is an error.
pub fn resolve_storage_config(config: &TomlConfig) -> Result<Option<S3Config>> {
    let storage = &config.storage;
    let bucket = resolve_secret("B2_BUCKET", storage.bucket.as_deref());
    let key_id = resolve_secret("B2_KEY_ID", storage.key_id.as_deref());
    let app_key = resolve_secret("B2_APP_KEY", storage.app_key.as_deref());
    let region = resolve_secret("B2_REGION", storage.region.as_deref());
    let endpoint = resolve_secret("B2_ENDPOINT", storage.endpoint.as_deref());

    match (bucket, key_id, app_key) {
        (None, None, None) => Ok(None),
        (Some(bucket), Some(access_key_id), Some(secret_access_key)) => Ok(Some(S3Config {
            bucket,
            region: region.unwrap_or_else(|| DEFAULT_STORAGE_REGION.to_string()),
            endpoint,
            access_key_id,
            secret_access_key,
            url_expiry: Duration::from_secs(storage.url_expiry_secs),
        })),
        (bucket, key_id, app_key) => {
            let missing: Vec<&str> = [
                ("B2_BUCKET", bucket.is_none()),
                ("B2_KEY_ID", key_id.is_none()),
                ("B2_APP_KEY", app_key.is_none()),
            ]
            .iter()
            .filter(|(_, absent)| *absent)
            .map(|(name, _)| *name)
            .collect();
            Err(Error::Config(format!(
                "Incomplete storage configuration, missing {}",
                missing.join(", ")
            )))
        }
    }
}

/// Pipeline parameters from the `[analysis]` section
pub fn pipeline_config(section: &AnalysisSection) -> PipelineConfig {
    let prompt = match section.prompt.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => DEFAULT_PROMPT.to_string(),
    };

    if !prompt_requests_marker(&prompt) {
        warn!("Configured prompt does not request the individuals marker; individuals will be empty");
    }

    let staging_dir = section
        .staging_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("memoria-staging"));

    info!(
        primary = %section.primary_model,
        fallback = %section.fallback_model,
        staging_dir = %staging_dir.display(),
        "Analysis pipeline configured"
    );

    PipelineConfig {
        models: ModelPair {
            primary: section.primary_model.clone(),
            fallback: section.fallback_model.clone(),
        },
        prompt,
        poll: PollPolicy {
            interval: Duration::from_millis(section.poll_interval_ms),
            timeout: Duration::from_secs(section.poll_timeout_secs),
        },
        staging_dir,
    }
}
