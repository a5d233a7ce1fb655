//! Track references and resolved sources

use serde::{Deserialize, Serialize};
use tunegrab_common::sanitize_filename;

/// Logical track: what the user asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackReference {
    /// Display name (track title)
    pub name: String,
    /// Primary artist name
    pub artist: String,
    /// Canonical catalog or source URL, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl TrackReference {
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            source_url: None,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Identity used in logs: (sanitized name, artist)
    pub fn identity(&self) -> (String, &str) {
        (sanitize_filename(&self.name), self.artist.as_str())
    }

    /// Query string handed to search providers
    pub fn search_query(&self) -> String {
        format!("{} {}", self.artist, self.name)
    }
}

/// Where a resolved source came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Found by searching for a catalog track
    CatalogBacked,
    /// URL supplied directly by the client
    DirectUrl,
}

/// Concrete audio source produced by the track resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// URL the media extractor can fetch
    pub locator: String,
    pub kind: SourceKind,
}

impl ResolvedSource {
    /// Source for a video id returned by the song search
    pub fn from_video_id(video_id: &str) -> Self {
        Self {
            locator: format!("https://www.youtube.com/watch?v={}", video_id),
            kind: SourceKind::CatalogBacked,
        }
    }

    pub fn direct(url: impl Into<String>) -> Self {
        Self {
            locator: url.into(),
            kind: SourceKind::DirectUrl,
        }
    }
}

/// Output of the track resolver: the reference (possibly filled in from
/// provider metadata) plus its source
#[derive(Debug, Clone)]
pub struct ResolvedTrack {
    pub reference: TrackReference,
    pub source: ResolvedSource,
    /// Video thumbnail, only known for direct URLs
    pub thumbnail_url: Option<String>,
}
