//! Track resolver
//!
//! Turns a logical track, or a URL on a direct-source domain, into exactly
//! one source the media extractor can fetch. The top-ranked song hit is
//! taken as-is; there is no secondary scoring.

use std::sync::Arc;

use crate::models::{ResolvedSource, ResolvedTrack, TrackReference};
use crate::types::{MediaExtractor, ProviderError, SongSearch};

/// Artist used when a direct URL has no uploader
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// What the client asked to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackRequest {
    /// Logical track, searched for by "<artist> <title>"
    Catalog(TrackReference),
    /// URL on a direct-source domain
    Direct(String),
}

impl TrackRequest {
    /// Short description for logs and batch errors
    pub fn label(&self) -> String {
        match self {
            TrackRequest::Catalog(track) => format!("{} - {}", track.artist, track.name),
            TrackRequest::Direct(url) => url.clone(),
        }
    }
}

/// Resolution failure
#[derive(Debug, thiserror::Error)]
#[error("No source found for {request}: {reason}")]
pub struct NotFound {
    pub request: String,
    pub reason: String,
}

#[derive(Clone)]
pub struct TrackResolver {
    songs: Arc<dyn SongSearch>,
    extractor: Arc<dyn MediaExtractor>,
}

impl TrackResolver {
    pub fn new(songs: Arc<dyn SongSearch>, extractor: Arc<dyn MediaExtractor>) -> Self {
        Self { songs, extractor }
    }

    /// No filesystem writes happen here
    pub async fn resolve(&self, request: &TrackRequest) -> Result<ResolvedTrack, NotFound> {
        let not_found = |reason: String| NotFound {
            request: request.label(),
            reason,
        };

        match request {
            TrackRequest::Catalog(track) => {
                let query = track.search_query();
                let hit = match self.songs.first_song(&query).await {
                    Ok(Some(hit)) => hit,
                    Ok(None) => return Err(not_found("no song results".to_string())),
                    Err(ProviderError::NotFound(msg)) => return Err(not_found(msg)),
                    Err(e) => return Err(not_found(format!("song search failed: {}", e))),
                };

                let (name, artist) = track.identity();
                tracing::info!(
                    track = %name,
                    artist = %artist,
                    video_id = %hit.video_id,
                    hit_title = hit.title.as_deref().unwrap_or("-"),
                    "Resolved catalog track"
                );

                Ok(ResolvedTrack {
                    reference: track.clone(),
                    source: ResolvedSource::from_video_id(&hit.video_id),
                    thumbnail_url: None,
                })
            }
            TrackRequest::Direct(url) => {
                let info = self
                    .extractor
                    .probe(url)
                    .await
                    .map_err(|e| not_found(format!("metadata probe failed: {}", e)))?;

                let artist = info
                    .uploader
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

                tracing::info!(url = %url, title = %info.title, artist = %artist, "Resolved direct URL");

                Ok(ResolvedTrack {
                    reference: TrackReference::new(info.title, artist).with_source_url(url.clone()),
                    source: ResolvedSource::direct(url.clone()),
                    thumbnail_url: info.thumbnail,
                })
            }
        }
    }
}
