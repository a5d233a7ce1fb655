//! tunegrab-server - Main entry point
//!
//! Music search and download service: catalog/video search, single-track
//! downloads and zipped playlist downloads, transcoded and tagged on the fly.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tunegrab_common::config::{default_config_path, TempDirInitializer, TempDirResolver, TomlConfig};

use tunegrab_server::config::ServiceConfig;
use tunegrab_server::services::{
    FfmpegTranscoder, HttpImageSource, LrclibClient, SpotifyClient, YouTubeClient, YtDlp, YtMusicClient,
};
use tunegrab_server::workflow::StagingArea;
use tunegrab_server::{build_router, AppState, Collaborators};

/// Command-line arguments for tunegrab-server
#[derive(Parser, Debug)]
#[command(name = "tunegrab-server")]
#[command(about = "Music search and download service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000", env = "TUNEGRAB_PORT")]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "127.0.0.1", env = "TUNEGRAB_BIND")]
    bind: IpAddr,

    /// Configuration file (default: <config dir>/tunegrab/config.toml)
    #[arg(short, long, env = "TUNEGRAB_CONFIG")]
    config: Option<PathBuf>,

    /// Staging folder for in-flight downloads (also TUNEGRAB_TEMP_DIR)
    #[arg(long)]
    temp_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let toml_config = match &config_path {
        Some(path) => TomlConfig::load(path).context("Failed to load configuration")?,
        None => TomlConfig::default(),
    };

    // Initialize tracing
    let default_filter = format!(
        "tunegrab_server={0},tunegrab_common={0},tower_http=info",
        toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tunegrab-server v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) if path.exists() => info!("Configuration file: {}", path.display()),
        Some(path) => info!("No configuration file at {}, using defaults", path.display()),
        None => info!("No configuration directory available, using defaults"),
    }

    // Temp folder
    let temp_dir = TempDirResolver::new(args.temp_dir.as_deref(), Some(&toml_config)).resolve();
    let initializer = TempDirInitializer::new(temp_dir);
    initializer
        .ensure_directory_exists()
        .context("Failed to create temp folder")?;
    info!("Temp folder: {}", initializer.path().display());

    match StagingArea::sweep_stale(initializer.path()) {
        Ok(0) => {}
        Ok(n) => info!("Removed {} stale staging folder(s)", n),
        Err(e) => warn!("Failed to sweep stale staging folders: {}", e),
    }

    // Collaborators
    let service_config = ServiceConfig::resolve(&toml_config);
    let collaborators = Collaborators {
        catalog: Arc::new(SpotifyClient::new(service_config.spotify.clone()).context("Spotify client")?),
        videos: Arc::new(YouTubeClient::new(service_config.youtube_api_key.clone()).context("YouTube client")?),
        songs: Arc::new(YtMusicClient::new().context("YouTube Music client")?),
        extractor: Arc::new(YtDlp::new(service_config.ytdlp_path.clone())),
        transcoder: Arc::new(FfmpegTranscoder::new(service_config.ffmpeg_path.clone())),
        lyrics: Arc::new(LrclibClient::new().context("LRCLIB client")?),
        images: Arc::new(HttpImageSource::new().context("Image client")?),
    };

    if let Some(timeout) = service_config.request_timeout {
        info!("Download deadline: {}s", timeout.as_secs());
    }

    let state = AppState::new(
        collaborators,
        initializer.path().to_path_buf(),
        service_config.request_timeout,
    );
    let app = build_router(state);

    let addr = SocketAddr::new(args.bind, args.port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
