//! Spotify Web API client
//!
//! Catalog search, track/playlist/album lookup and album artwork.
//! Authenticates with the client-credentials flow; the access token is
//! cached per client handle and refreshed shortly before it expires.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::models::TrackReference;
use crate::types::{ArtworkLookup, CatalogCollection, CatalogTrack, MusicCatalog, ProviderError};

const API_BASE_URL: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const USER_AGENT: &str = concat!("tunegrab/", env!("CARGO_PKG_VERSION"));
/// Refresh this long before the token actually expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const PLAYLIST_PAGE_SIZE: u32 = 100;
const ALBUM_PAGE_SIZE: u32 = 50;

/// Client-credentials pair
#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Spotify URL or URI, as pasted by a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotifyLink {
    Track(String),
    Playlist(String),
    Album(String),
}

/// Parse `https://open.spotify.com/<kind>/<id>?...` or `spotify:<kind>:<id>`
///
/// Locale prefixes (`/intl-de/track/...`) are skipped.
pub fn parse_spotify_url(url: &str) -> Option<SpotifyLink> {
    let (kind, id) = if let Some(rest) = url.strip_prefix("spotify:") {
        let mut parts = rest.split(':');
        (parts.next()?, parts.next()?)
    } else {
        let after_host = url.split_once("spotify.com/")?.1;
        let mut segments = after_host
            .split(['?', '#'])
            .next()?
            .split('/')
            .filter(|s| !s.is_empty() && !s.starts_with("intl-"));
        (segments.next()?, segments.next()?)
    };

    if id.is_empty() {
        return None;
    }

    match kind {
        "track" => Some(SpotifyLink::Track(id.to_string())),
        "playlist" => Some(SpotifyLink::Playlist(id.to_string())),
        "album" => Some(SpotifyLink::Album(id.to_string())),
        _ => None,
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct SpArtist {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SpImage {
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SpAlbum {
    #[serde(default)]
    images: Vec<SpImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SpExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SpTrack {
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<SpArtist>,
    #[serde(default)]
    external_urls: SpExternalUrls,
    /// Absent on simplified (album listing) track objects
    album: Option<SpAlbum>,
}

impl SpTrack {
    fn primary_artist(&self) -> String {
        self.artists.first().map(|a| a.name.clone()).unwrap_or_default()
    }

    /// Spotify lists images widest first
    fn artwork_url(&self) -> Option<String> {
        self.album.as_ref()?.images.first().map(|i| i.url.clone())
    }

    fn into_catalog_track(self) -> CatalogTrack {
        let artist = self.primary_artist();
        let id = self.id.unwrap_or_default();
        let url = self
            .external_urls
            .spotify
            .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", id));
        CatalogTrack {
            id,
            name: self.name,
            artist,
            url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Paging<SpTrack>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    /// Null for removed/local tracks
    track: Option<SpTrack>,
}

// ============================================================================
// Client
// ============================================================================

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    credentials: Option<SpotifyCredentials>,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(credentials: Option<SpotifyCredentials>) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            credentials,
            token: Mutex::new(None),
        })
    }

    /// Current access token, fetching a new one when missing or stale
    async fn access_token(&self) -> Result<String, ProviderError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "Spotify credentials missing (set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET)"
                    .to_string(),
            )
        })?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("Requesting Spotify access token");

        let response = self
            .http_client
            .post(TOKEN_URL)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, ProviderError> {
        let token = self.access_token().await?;

        tracing::debug!(url = %url, "Querying Spotify API");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();

        if status == 404 {
            return Err(ProviderError::NotFound(url.to_string()));
        }

        if status == 401 {
            // Token revoked early; force a refresh on the next call
            self.token.lock().await.take();
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        Ok(response.json().await?)
    }

    async fn fetch_track(&self, track_id: &str) -> Result<SpTrack, ProviderError> {
        self.get_json(&format!("{}/tracks/{}", API_BASE_URL, track_id), &[]).await
    }

    async fn search_raw(&self, query: &str, limit: usize) -> Result<Vec<SpTrack>, ProviderError> {
        let response: SearchResponse = self
            .get_json(
                &format!("{}/search", API_BASE_URL),
                &[
                    ("q", query.to_string()),
                    ("type", "track".to_string()),
                    ("limit", limit.clamp(1, 50).to_string()),
                ],
            )
            .await?;
        Ok(response.tracks.items)
    }

    /// Walk a paged listing until `next` runs out
    async fn collect_pages<T: DeserializeOwned>(
        &self,
        first_url: String,
        page_size: u32,
    ) -> Result<Vec<T>, ProviderError> {
        let mut items = Vec::new();
        let mut page: Paging<T> = self
            .get_json(&first_url, &[("limit", page_size.to_string())])
            .await?;

        loop {
            items.append(&mut page.items);
            match page.next.take() {
                // `next` already carries offset and limit
                Some(next_url) => page = self.get_json(&next_url, &[]).await?,
                None => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl MusicCatalog for SpotifyClient {
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>, ProviderError> {
        let tracks = self.search_raw(query, limit).await?;

        tracing::info!(query = %query, results = tracks.len(), "Spotify track search");

        Ok(tracks
            .into_iter()
            .take(limit)
            .map(SpTrack::into_catalog_track)
            .collect())
    }

    async fn track(&self, track_id: &str) -> Result<CatalogTrack, ProviderError> {
        let track = self.fetch_track(track_id).await?;

        tracing::info!(
            track_id = %track_id,
            name = %track.name,
            artist = %track.primary_artist(),
            "Retrieved track from Spotify"
        );

        Ok(track.into_catalog_track())
    }

    async fn collection_tracks(
        &self,
        collection: &CatalogCollection,
    ) -> Result<Vec<TrackReference>, ProviderError> {
        let tracks: Vec<SpTrack> = match collection {
            CatalogCollection::Playlist(id) => {
                let items: Vec<PlaylistItem> = self
                    .collect_pages(format!("{}/playlists/{}/tracks", API_BASE_URL, id), PLAYLIST_PAGE_SIZE)
                    .await?;
                items.into_iter().filter_map(|item| item.track).collect()
            }
            CatalogCollection::Album(id) => {
                self.collect_pages(format!("{}/albums/{}/tracks", API_BASE_URL, id), ALBUM_PAGE_SIZE)
                    .await?
            }
        };

        tracing::info!(collection = ?collection, tracks = tracks.len(), "Retrieved Spotify collection");

        Ok(tracks
            .into_iter()
            .map(|t| t.into_catalog_track().into_reference())
            .collect())
    }

    async fn artwork_url(&self, lookup: &ArtworkLookup) -> Result<Option<String>, ProviderError> {
        let track = match lookup {
            ArtworkLookup::TrackId(id) => Some(self.fetch_track(id).await?),
            ArtworkLookup::Query(query) => self.search_raw(query, 1).await?.into_iter().next(),
        };
        Ok(track.and_then(|t| t.artwork_url()))
    }
}
