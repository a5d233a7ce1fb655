//! YouTube Music song search
//!
//! Uses the web client's internal search endpoint with the "songs" filter.
//! The response is a deeply nested renderer tree; only the first
//! `musicResponsiveListItemRenderer` is of interest.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::types::{ProviderError, SongHit, SongSearch};

const SEARCH_URL: &str = "https://music.youtube.com/youtubei/v1/search";
const CLIENT_NAME: &str = "WEB_REMIX";
const CLIENT_VERSION: &str = "1.20240101.01.00";
/// Search params selecting the "songs" shelf
const SONGS_FILTER_PARAMS: &str = "EgWKAQIIAWoMEA4QChADEAQQCRAF";
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// YouTube Music search client (no credentials required)
pub struct YtMusicClient {
    http_client: reqwest::Client,
}

impl YtMusicClient {
    pub fn new() -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }
}

fn search_body(query: &str) -> Value {
    json!({
        "context": {
            "client": {
                "clientName": CLIENT_NAME,
                "clientVersion": CLIENT_VERSION,
                "hl": "en",
            }
        },
        "query": query,
        "params": SONGS_FILTER_PARAMS,
    })
}

/// Depth-first search for the first object stored under `key`
fn find_first<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            if let Some(found) = map.get(key) {
                return Some(found);
            }
            map.values().find_map(|v| find_first(v, key))
        }
        Value::Array(items) => items.iter().find_map(|v| find_first(v, key)),
        _ => None,
    }
}

/// First song row of a search response
fn first_song_hit(response: &Value) -> Option<SongHit> {
    let renderer = find_first(response, "musicResponsiveListItemRenderer")?;

    let video_id = renderer
        .pointer("/playlistItemData/videoId")
        .or_else(|| find_first(renderer, "videoId"))
        .and_then(Value::as_str)?
        .to_string();

    let title = renderer
        .pointer("/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(SongHit { video_id, title })
}

#[async_trait]
impl SongSearch for YtMusicClient {
    async fn first_song(&self, query: &str) -> Result<Option<SongHit>, ProviderError> {
        tracing::debug!(query = %query, "Searching YouTube Music songs");

        let response = self
            .http_client
            .post(SEARCH_URL)
            .query(&[("prettyPrint", "false")])
            .header("Origin", "https://music.youtube.com")
            .json(&search_body(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let body: Value = response.json().await?;
        let hit = first_song_hit(&body);

        tracing::info!(
            query = %query,
            video_id = hit.as_ref().map(|h| h.video_id.as_str()).unwrap_or("-"),
            "YouTube Music song search"
        );

        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song_row(video_id: &str, title: &str) -> Value {
        json!({
            "musicResponsiveListItemRenderer": {
                "flexColumns": [
                    {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [{"text": title}]}}}
                ],
                "playlistItemData": {"videoId": video_id}
            }
        })
    }

    #[test]
    fn test_first_song_hit_takes_top_row() {
        let response = json!({
            "contents": {
                "tabbedSearchResultsRenderer": {
                    "tabs": [{
                        "tabRenderer": {
                            "content": {
                                "sectionListRenderer": {
                                    "contents": [{
                                        "musicShelfRenderer": {
                                            "contents": [song_row("first", "Silence"), song_row("second", "Other")]
                                        }
                                    }]
                                }
                            }
                        }
                    }]
                }
            }
        });

        let hit = first_song_hit(&response).unwrap();
        assert_eq!(hit.video_id, "first");
        assert_eq!(hit.title.as_deref(), Some("Silence"));
    }

    #[test]
    fn test_no_rows_means_no_hit() {
        let response = json!({"contents": {"sectionListRenderer": {"contents": []}}});
        assert!(first_song_hit(&response).is_none());
    }

    #[test]
    fn test_search_body_carries_songs_filter() {
        let body = search_body("Delerium Silence");
        assert_eq!(body["query"], "Delerium Silence");
        assert_eq!(body["params"], SONGS_FILTER_PARAMS);
        assert_eq!(body["context"]["client"]["clientName"], "WEB_REMIX");
    }
}
