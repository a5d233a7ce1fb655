//! YouTube Data API v3 client
//!
//! Video search restricted to the "Music" category (id 10). The search
//! endpoint does not return categories, so hits are re-checked with a
//! single batched `videos` lookup; search order is kept.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::types::{ProviderError, VideoHit, VideoSearch};

const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const USER_AGENT: &str = concat!("tunegrab/", env!("CARGO_PKG_VERSION"));
const MUSIC_CATEGORY_ID: &str = "10";
const MAX_RESULTS: u32 = 5;

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    kind: String,
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    category_id: Option<String>,
}

/// YouTube Data API client
pub struct YouTubeClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
}

impl YouTubeClient {
    pub fn new(api_key: Option<String>) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self { http_client, api_key })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured("YouTube API key missing (set YOUTUBE_API_KEY)".to_string())
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", API_BASE_URL, endpoint);
        let response = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key()?)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        Ok(response.json().await?)
    }

    /// Ids among `video_ids` that belong to the Music category
    async fn music_video_ids(&self, video_ids: &[String]) -> Result<HashSet<String>, ProviderError> {
        if video_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = video_ids.join(",");
        let response: VideoListResponse = self
            .get("videos", &[("part", "snippet"), ("id", ids.as_str())])
            .await?;

        Ok(music_category_ids(response))
    }
}

fn candidate_hits(response: SearchListResponse) -> Vec<VideoHit> {
    response
        .items
        .into_iter()
        .filter(|item| item.id.kind == "youtube#video")
        .filter_map(|item| {
            Some(VideoHit {
                title: item.snippet.title,
                video_id: item.id.video_id?,
            })
        })
        .collect()
}

fn music_category_ids(response: VideoListResponse) -> HashSet<String> {
    response
        .items
        .into_iter()
        .filter(|v| v.snippet.category_id.as_deref() == Some(MUSIC_CATEGORY_ID))
        .map(|v| v.id)
        .collect()
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search_music_videos(&self, query: &str) -> Result<Vec<VideoHit>, ProviderError> {
        let max_results = MAX_RESULTS.to_string();
        let response: SearchListResponse = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "video"),
                    ("videoCategoryId", MUSIC_CATEGORY_ID),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        let candidates = candidate_hits(response);
        let ids: Vec<String> = candidates.iter().map(|h| h.video_id.clone()).collect();
        let music_ids = self.music_video_ids(&ids).await?;

        let hits: Vec<VideoHit> = candidates
            .into_iter()
            .filter(|h| music_ids.contains(&h.video_id))
            .collect();

        tracing::info!(query = %query, results = hits.len(), "YouTube music video search");

        Ok(hits)
    }
}
