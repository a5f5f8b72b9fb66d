//! Memoria API (memoria-api) - Main entry point
//!
//! HTTP microservice behind the Memoria web app: evidence media analysis,
//! clip storage, movie catalog proxy and visitor geolocation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memoria_api::config::{
    log_filter, pipeline_config, resolve_gemini_api_key, resolve_storage_config,
    resolve_tmdb_auth, DEFAULT_LOG_FILTER,
};
use memoria_api::pipeline::AnalysisPipeline;
use memoria_api::services::{GeminiClient, HttpGeoLocator, S3ClipStore, TmdbClient};
use memoria_api::{build_router, AppState};
use memoria_common::config::{default_config_path, load_toml_config, TomlConfig};

const MODULE_NAME: &str = "memoria-api";

/// Command-line arguments for memoria-api
#[derive(Parser, Debug)]
#[command(name = "memoria-api")]
#[command(about = "Media analysis and catalog microservice for Memoria")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5780", env = "MEMORIA_PORT")]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "127.0.0.1", env = "MEMORIA_BIND")]
    bind: std::net::IpAddr,

    /// Configuration file (defaults to the platform config dir)
    #[arg(short, long, env = "MEMORIA_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| default_config_path(MODULE_NAME));

    // The config file may set the log level, so it is read before the
    // subscriber is installed and its outcome is logged after.
    let loaded = config_path.as_deref().map(load_toml_config);
    let file_config = match &loaded {
        Some(Ok(Some(config))) => Some(config),
        _ => None,
    };
    let filter = log_filter(file_config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(filter))
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Memoria API v{}", env!("CARGO_PKG_VERSION"));

    let toml_config = match (loaded, config_path.as_deref()) {
        (Some(result), Some(path)) => {
            match result.context("Failed to load configuration")? {
                Some(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                None => {
                    warn!(
                        "Config file {} not found, using built-in defaults",
                        path.display()
                    );
                    TomlConfig::default()
                }
            }
        }
        _ => {
            warn!("No config directory available, using built-in defaults");
            TomlConfig::default()
        }
    };

    let state = build_state(&toml_config)?;
    let app = build_router(state);

    let addr = SocketAddr::new(args.bind, args.port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Construct service clients once and inject them into the router state
fn build_state(config: &TomlConfig) -> Result<AppState> {
    let geo = HttpGeoLocator::new(&config.geo.ip_service_url, &config.geo.geo_service_base)
        .context("Failed to create geolocation client")?;
    let mut state = AppState::new(Arc::new(geo))
        .with_max_upload_bytes(config.analysis.max_upload_bytes);

    match resolve_gemini_api_key(config) {
        Some(api_key) => {
            let client = GeminiClient::new(
                api_key,
                &config.gemini.api_base,
                Duration::from_secs(config.gemini.request_timeout_secs),
            )
            .context("Failed to create Gemini client")?;
            let pipeline = AnalysisPipeline::new(Arc::new(client), pipeline_config(&config.analysis));
            state = state.with_analysis(Arc::new(pipeline));
        }
        None => warn!("GOOGLE_API_KEY not set, /api/analyze-evidence disabled"),
    }

    match resolve_tmdb_auth(config) {
        Some(auth) => {
            let client = TmdbClient::new(auth, &config.tmdb.api_base)
                .context("Failed to create TMDB client")?;
            state = state.with_movies(Arc::new(client), config.tmdb.pages_to_fetch);
        }
        None => warn!("TMDB credentials not set, movie catalog routes disabled"),
    }

    match resolve_storage_config(config).context("Invalid storage configuration")? {
        Some(s3) => {
            info!(bucket = %s3.bucket, region = %s3.region, "Clip storage configured");
            let store = S3ClipStore::new(s3).context("Failed to create clip store")?;
            state = state.with_clips(Arc::new(store));
        }
        None => warn!("Clip storage not configured, /api/b2 routes disabled"),
    }

    Ok(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
