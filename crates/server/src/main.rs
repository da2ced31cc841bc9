use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waloo_core::media::sweep_stale_files;
use waloo_core::{
    load_config, load_config_or_default, validate_config, Config, CookieJar, MediaExtractor,
    YtDlpExtractor,
};
use waloo_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file used when `WALOO_CONFIG` is not set. May be absent.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("WALOO media server v{}", VERSION);

    let config = load()?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("yt-dlp: {:?}", config.extractor.ytdlp_path);
    info!("ffmpeg: {:?}", config.extractor.ffmpeg_path);
    info!("Temp dir: {:?}", config.extractor.temp_dir);
    info!("Format list: {:?}", config.formats.mode);

    let temp_dir = &config.extractor.temp_dir;
    tokio::fs::create_dir_all(temp_dir)
        .await
        .with_context(|| format!("Failed to create temp dir {:?}", temp_dir))?;

    // Leftovers from a crash; anything younger may belong to a live download
    let stale_after = Duration::from_secs(config.extractor.download_timeout_secs.saturating_mul(2));
    if let Err(e) = sweep_stale_files(temp_dir, stale_after).await {
        warn!("Failed to sweep stale temp files in {:?}: {}", temp_dir, e);
    }

    let cookies = CookieJar::from_config(&config.cookies, temp_dir)
        .context("Failed to prepare cookie file")?;
    match cookies.path() {
        Some(path) => info!("Using cookie file {:?}", path),
        None => info!("No cookie file configured"),
    }

    let extractor = YtDlpExtractor::from_config(&config, cookies);

    // A missing yt-dlp is reported per request, so only warn here
    match extractor.validate().await {
        Ok(version) => info!("Using yt-dlp {}", version),
        Err(e) => warn!("yt-dlp is not usable: {}", e),
    }

    // Create app state
    let state = Arc::new(AppState::new(Arc::new(extractor)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");

    Ok(())
}

/// Loads the config named by `WALOO_CONFIG`, or `config.toml` if present.
fn load() -> Result<Config> {
    match std::env::var("WALOO_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        Err(_) => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            info!("Loading configuration from {:?} (optional)", path);
            load_config_or_default(path)
                .with_context(|| format!("Failed to load config from {:?}", path))
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
