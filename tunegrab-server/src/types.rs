//! Collaborator traits and shared types
//!
//! The pipeline and the API layer only see these traits. Concrete clients
//! (Spotify, YouTube, YouTube Music, yt-dlp, ffmpeg, LRCLIB) live in
//! `services` and are injected at startup; tests inject fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{AudioFormatProfile, ResolvedSource, TrackReference};
use crate::services::transcoder::TranscodeError;

// ============================================================================
// Errors
// ============================================================================

/// Errors from search/catalog/lyrics providers
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Errors while fetching media or images
#[derive(Debug, Error)]
pub enum FetchError {
    /// External tool could not be started (missing binary, permissions)
    #[error("Failed to start {tool}: {message}")]
    Spawn { tool: &'static str, message: String },

    /// External tool exited unsuccessfully
    #[error("{tool} failed (exit code {code:?}): {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    /// Tool reported success but produced no file
    #[error("Expected output not found: {0}")]
    MissingOutput(PathBuf),

    #[error("HTTP error {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Provider result types
// ============================================================================

/// Track returned by the music catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub url: String,
}

impl CatalogTrack {
    pub fn into_reference(self) -> TrackReference {
        TrackReference::new(self.name, self.artist).with_source_url(self.url)
    }
}

/// Multi-track catalog entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCollection {
    Playlist(String),
    Album(String),
}

/// How to find catalog artwork for a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkLookup {
    /// Catalog track id is known
    TrackId(String),
    /// Search the catalog and take the first hit
    Query(String),
}

/// Video search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoHit {
    pub title: String,
    pub video_id: String,
}

/// Song search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongHit {
    pub video_id: String,
    pub title: Option<String>,
}

/// Provider metadata for a direct media URL
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Music catalog (search, track lookup, playlists/albums, artwork)
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    /// Search tracks, provider order preserved
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>, ProviderError>;

    async fn track(&self, track_id: &str) -> Result<CatalogTrack, ProviderError>;

    async fn collection_tracks(
        &self,
        collection: &CatalogCollection,
    ) -> Result<Vec<TrackReference>, ProviderError>;

    /// URL of the largest artwork image, `None` if the track has none
    async fn artwork_url(&self, lookup: &ArtworkLookup) -> Result<Option<String>, ProviderError>;
}

/// Video search restricted to music videos
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search_music_videos(&self, query: &str) -> Result<Vec<VideoHit>, ProviderError>;
}

/// Song search used to turn a logical track into a video id
#[async_trait]
pub trait SongSearch: Send + Sync {
    /// Top-ranked hit in the "songs" category
    async fn first_song(&self, query: &str) -> Result<Option<SongHit>, ProviderError>;
}

/// Media resolution/extraction engine
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Read provider metadata without downloading media
    async fn probe(&self, url: &str) -> Result<MediaInfo, FetchError>;

    /// Download the best audio stream to `<stem>.<native ext>`
    ///
    /// Returns the path actually written.
    async fn fetch_audio(&self, source: &ResolvedSource, stem: &Path) -> Result<PathBuf, FetchError>;
}

/// Audio transcoding engine
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Encode `input` into `output` per `profile`
    ///
    /// On error nothing is left at `output`.
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        profile: &AudioFormatProfile,
    ) -> Result<(), TranscodeError>;
}

/// Lyrics lookup provider
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Time-synced (LRC) lyrics
    async fn synced_lyrics(&self, artist: &str, title: &str) -> Result<Option<String>, ProviderError>;

    /// Plain-text lyrics
    async fn plain_lyrics(&self, artist: &str, title: &str) -> Result<Option<String>, ProviderError>;
}

/// Image download
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// `Ok(None)` when the image does not exist (404)
    async fn fetch_image(&self, url: &str) -> Result<Option<Vec<u8>>, FetchError>;
}
