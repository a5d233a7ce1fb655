//! Download API handlers
//!
//! POST /api/download/track, POST /api/download/playlist
//!
//! The format and URL are validated before any provider or pipeline call.
//! Pipeline work runs under the configured request deadline.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};
use crate::models::AudioFormat;
use crate::services::{is_direct_source_url, parse_spotify_url, SpotifyLink, TrackRequest};
use crate::types::CatalogCollection;
use crate::workflow::PipelineError;
use crate::AppState;

const ARCHIVE_NAME: &str = "playlist.zip";

/// Request body for both download endpoints
#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub url: Option<String>,
    /// `mp3` when omitted
    pub format: Option<String>,
}

impl DownloadRequest {
    fn format(&self) -> ApiResult<AudioFormat> {
        match self.format.as_deref() {
            None => Ok(AudioFormat::Mp3),
            Some(value) => value
                .trim()
                .to_lowercase()
                .parse()
                .map_err(|e: crate::models::UnsupportedFormat| ApiError::BadRequest(e.to_string())),
        }
    }

    fn url(&self) -> ApiResult<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ApiError::BadRequest("URL required".to_string()))
    }
}

/// Malformed bodies get the same `{error}` 400 as any other bad request
fn parse_body(body: Result<Json<DownloadRequest>, JsonRejection>) -> ApiResult<DownloadRequest> {
    body.map(|Json(request)| request)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn invalid_url() -> ApiError {
    ApiError::from(PipelineError::Validation("Invalid URL".to_string()))
}

/// Run `work` under the optional deadline
async fn with_deadline<T, F>(deadline: Option<Duration>, work: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| PipelineError::TimedOut(limit.as_secs()))?,
        None => work.await,
    }
}

/// `Content-Disposition` for `file_name`, with an RFC 5987 UTF-8 variant
fn content_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();

    let mut encoded = String::new();
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }

    let value = format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", fallback, encoded);
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn attachment(content_type: &str, file_name: &str, data: Vec<u8>) -> Response {
    let content_type =
        HeaderValue::from_str(content_type).unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let headers: [(HeaderName, HeaderValue); 2] = [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_DISPOSITION, content_disposition(file_name)),
    ];
    (headers, data).into_response()
}

/// Keep the failure for `/health` before handing it to the client
async fn report(state: &AppState, error: ApiError) -> ApiError {
    if error.status().is_server_error() {
        state.record_error(error.to_string()).await;
    }
    error
}

/// POST /api/download/track
///
/// Spotify track URL or direct-source (YouTube) URL → single audio file.
pub async fn download_track(
    State(state): State<AppState>,
    body: Result<Json<DownloadRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = parse_body(body)?;
    let format = request.format()?;
    let url = request.url()?;

    let track_request = match parse_spotify_url(url) {
        Some(SpotifyLink::Track(id)) => match state.catalog.track(&id).await {
            Ok(track) => TrackRequest::Catalog(track.into_reference()),
            Err(e) => return Err(report(&state, e.into()).await),
        },
        Some(_) => return Err(invalid_url()),
        None if is_direct_source_url(url) => TrackRequest::Direct(url.to_string()),
        None => return Err(invalid_url()),
    };

    let downloaded = match with_deadline(state.request_timeout, state.pipeline.run(&track_request, format)).await {
        Ok(downloaded) => downloaded,
        Err(e) => return Err(report(&state, e.into()).await),
    };

    let file_name = downloaded.file_name().to_string();
    let data = downloaded
        .into_bytes()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to read finished file: {}", e)))?;

    tracing::info!(file = %file_name, bytes = data.len(), "Sending track");

    Ok(attachment(format.profile().mime_type, &file_name, data))
}

/// POST /api/download/playlist
///
/// Spotify playlist or album URL → ZIP of all tracks.
pub async fn download_playlist(
    State(state): State<AppState>,
    body: Result<Json<DownloadRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = parse_body(body)?;
    let format = request.format()?;
    let url = request.url()?;

    let collection = match parse_spotify_url(url) {
        Some(SpotifyLink::Playlist(id)) => CatalogCollection::Playlist(id),
        Some(SpotifyLink::Album(id)) => CatalogCollection::Album(id),
        _ => return Err(invalid_url()),
    };

    let tracks = match state.catalog.collection_tracks(&collection).await {
        Ok(tracks) => tracks,
        Err(e) => return Err(report(&state, e.into()).await),
    };

    let archive = match with_deadline(state.request_timeout, state.batch.run(&tracks, format)).await {
        Ok(archive) => archive,
        Err(e) => return Err(report(&state, e.into()).await),
    };

    tracing::info!(entries = archive.entries.len(), bytes = archive.data.len(), "Sending archive");

    Ok(attachment("application/zip", ARCHIVE_NAME, archive.data))
}

pub fn download_routes() -> Router<AppState> {
    Router::new()
        .route("/api/download/track", post(download_track))
        .route("/api/download/playlist", post(download_playlist))
}
