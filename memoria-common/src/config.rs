//! Configuration loading and secret resolution
//!
//! Bootstrap configuration comes from a single TOML file. A missing file is
//! not an error: the service starts with built-in defaults.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--port, --bind, --config)
//! 2. Environment variables (API keys, storage credentials)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Media analysis pipeline settings
    pub analysis: AnalysisSection,
    /// Generative media API settings
    pub gemini: GeminiSection,
    /// Movie metadata API settings
    pub tmdb: TmdbSection,
    /// Object storage settings
    pub storage: StorageSection,
    /// Public IP / geolocation services
    pub geo: GeoSection,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or full filter directive (e.g. "info", "memoria_api=debug");
    /// the service's own default filter applies when absent
    pub level: Option<String>,
}

/// `[analysis]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Model asked first
    pub primary_model: String,
    /// Model retried once when the primary fails
    pub fallback_model: String,
    /// Prompt template override (the built-in prompt is used when absent)
    pub prompt: Option<String>,
    /// Delay between job status queries
    pub poll_interval_ms: u64,
    /// Upper bound on the total time spent waiting for a job
    pub poll_timeout_secs: u64,
    /// Directory for transient staged uploads (system temp dir when absent)
    pub staging_dir: Option<PathBuf>,
    /// Largest accepted request body for upload routes
    pub max_upload_bytes: usize,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            primary_model: "gemini-1.5-pro".to_string(),
            fallback_model: "gemini-1.5-flash".to_string(),
            prompt: None,
            poll_interval_ms: 1500,
            poll_timeout_secs: 180,
            staging_dir: None,
            max_upload_bytes: 512 * 1024 * 1024,
        }
    }
}

/// `[gemini]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiSection {
    pub api_key: Option<String>,
    pub api_base: String,
    pub request_timeout_secs: u64,
}

impl Default for GeminiSection {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            request_timeout_secs: 300,
        }
    }
}

/// `[tmdb]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TmdbSection {
    /// v4 read access token (sent as a bearer token)
    pub token: Option<String>,
    /// v3 api key (sent as a query parameter)
    pub api_key: Option<String>,
    pub api_base: String,
    /// Pages merged by the trending and filter listings
    pub pages_to_fetch: u32,
}

impl Default for TmdbSection {
    fn default() -> Self {
        Self {
            token: None,
            api_key: None,
            api_base: "https://api.themoviedb.org/3".to_string(),
            pages_to_fetch: 5,
        }
    }
}

/// `[storage]` section (S3-compatible object storage)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub key_id: Option<String>,
    pub app_key: Option<String>,
    /// Lifetime of presigned download URLs
    pub url_expiry_secs: u64,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            endpoint: None,
            key_id: None,
            app_key: None,
            url_expiry_secs: 7200,
        }
    }
}

/// `[geo]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeoSection {
    /// Public IP echo service
    pub ip_service_url: String,
    /// IP geolocation service base URL
    pub geo_service_base: String,
}

impl Default for GeoSection {
    fn default() -> Self {
        Self {
            ip_service_url: "https://api.ipify.org?format=json".to_string(),
            geo_service_base: "https://ipapi.co".to_string(),
        }
    }
}

/// Default configuration file path for the platform
///
/// `<config_dir>/memoria/<module_name>.toml`, e.g.
/// `~/.config/memoria/memoria-api.toml` on Linux.
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("memoria").join(format!("{}.toml", module_name)))
}

/// Load bootstrap configuration
///
/// `Ok(None)` when the file does not exist; an unreadable or invalid file is
/// a configuration error. Nothing is logged here so callers can load the
/// file before their subscriber is installed.
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    Ok(Some(config))
}

/// Resolve a secret from environment then TOML
///
/// Blank values are ignored. Warns when both sources carry a value since the
/// environment silently shadows the file.
pub fn resolve_secret(env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    match (env_value, toml_value) {
        (Some(env), Some(_)) => {
            warn!(
                "{} found in environment and TOML config. Using environment (highest priority).",
                env_var
            );
            Some(env)
        }
        (Some(env), None) => {
            info!("{} loaded from environment variable", env_var);
            Some(env)
        }
        (None, Some(toml)) => {
            info!("{} loaded from TOML config", env_var);
            Some(toml.to_string())
        }
        (None, None) => None,
    }
}

/// Validate key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
