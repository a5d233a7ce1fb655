//! Lyrics lookup
//!
//! `LrclibClient` talks to the LRCLIB search API. `LyricsResolver` applies
//! the lookup policy: synced lyrics first, plain text as fallback, provider
//! errors logged and treated as "no lyrics".

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::types::{LyricsProvider, ProviderError};

const LRCLIB_SEARCH_URL: &str = "https://lrclib.net/api/search";
const USER_AGENT: &str = concat!("tunegrab/", env!("CARGO_PKG_VERSION"), " (https://lrclib.net)");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrclibRecord {
    synced_lyrics: Option<String>,
    plain_lyrics: Option<String>,
}

/// LRCLIB HTTP client
pub struct LrclibClient {
    http_client: reqwest::Client,
}

impl LrclibClient {
    pub fn new() -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }

    async fn search(&self, artist: &str, title: &str) -> Result<Vec<LrclibRecord>, ProviderError> {
        let response = self
            .http_client
            .get(LRCLIB_SEARCH_URL)
            .query(&[("artist_name", artist), ("track_name", title)])
            .send()
            .await?;

        let status = response.status();
        if status == 404 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        Ok(response.json().await?)
    }
}

/// First non-blank value picked by `field` across the records
fn first_non_blank(records: Vec<LrclibRecord>, field: fn(LrclibRecord) -> Option<String>) -> Option<String> {
    records
        .into_iter()
        .filter_map(field)
        .find(|text| !text.trim().is_empty())
}

#[async_trait]
impl LyricsProvider for LrclibClient {
    async fn synced_lyrics(&self, artist: &str, title: &str) -> Result<Option<String>, ProviderError> {
        let records = self.search(artist, title).await?;
        Ok(first_non_blank(records, |r| r.synced_lyrics))
    }

    async fn plain_lyrics(&self, artist: &str, title: &str) -> Result<Option<String>, ProviderError> {
        let records = self.search(artist, title).await?;
        Ok(first_non_blank(records, |r| r.plain_lyrics))
    }
}

/// Synced-then-plain lyrics lookup that never fails
#[derive(Clone)]
pub struct LyricsResolver {
    provider: Arc<dyn LyricsProvider>,
}

impl LyricsResolver {
    pub fn new(provider: Arc<dyn LyricsProvider>) -> Self {
        Self { provider }
    }

    pub async fn resolve(&self, artist: &str, title: &str) -> Option<String> {
        match self.provider.synced_lyrics(artist, title).await {
            Ok(Some(lyrics)) => {
                tracing::debug!(artist = %artist, title = %title, "Using synced lyrics");
                return Some(lyrics);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(artist = %artist, title = %title, error = %e, "Synced lyrics lookup failed");
            }
        }

        match self.provider.plain_lyrics(artist, title).await {
            Ok(Some(lyrics)) => {
                tracing::debug!(artist = %artist, title = %title, "Using plain lyrics");
                Some(lyrics)
            }
            Ok(None) => {
                tracing::debug!(artist = %artist, title = %title, "No lyrics found");
                None
            }
            Err(e) => {
                tracing::warn!(artist = %artist, title = %title, error = %e, "Plain lyrics lookup failed");
                None
            }
        }
    }
}
