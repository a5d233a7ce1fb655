//! tunegrab-server library interface
//!
//! Exposes the router and state so integration tests can drive the service
//! with fake collaborators.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod types;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{CoverArtFetcher, LyricsResolver, TrackResolver};
use crate::types::{ImageSource, LyricsProvider, MediaExtractor, MusicCatalog, SongSearch, Transcoder, VideoSearch};
use crate::workflow::{BatchOrchestrator, DownloadPipeline};

/// External collaborators injected at startup
pub struct Collaborators {
    pub catalog: Arc<dyn MusicCatalog>,
    pub videos: Arc<dyn VideoSearch>,
    pub songs: Arc<dyn SongSearch>,
    pub extractor: Arc<dyn MediaExtractor>,
    pub transcoder: Arc<dyn Transcoder>,
    pub lyrics: Arc<dyn LyricsProvider>,
    pub images: Arc<dyn ImageSource>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn MusicCatalog>,
    pub videos: Arc<dyn VideoSearch>,
    pub pipeline: Arc<DownloadPipeline>,
    pub batch: BatchOrchestrator,
    /// Deadline for one download request; `None` disables it
    pub request_timeout: Option<Duration>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Most recent pipeline failure, reported by `/health`
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(collaborators: Collaborators, temp_root: PathBuf, request_timeout: Option<Duration>) -> Self {
        let Collaborators {
            catalog,
            videos,
            songs,
            extractor,
            transcoder,
            lyrics,
            images,
        } = collaborators;

        let pipeline = Arc::new(DownloadPipeline::new(
            TrackResolver::new(songs, extractor.clone()),
            extractor,
            transcoder,
            CoverArtFetcher::new(catalog.clone(), images),
            LyricsResolver::new(lyrics),
            temp_root,
        ));

        Self {
            catalog,
            videos,
            batch: BatchOrchestrator::new(pipeline.clone()),
            pipeline,
            request_timeout,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::search_routes())
        .merge(api::download_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
