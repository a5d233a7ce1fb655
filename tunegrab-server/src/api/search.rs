//! Search API handlers
//!
//! GET /api/search/spotify, GET /api/search/youtube

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::types::VideoHit;
use crate::AppState;

/// Catalog results returned per search
const CATALOG_SEARCH_LIMIT: usize = 5;

/// Query string for both search endpoints
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

impl SearchParams {
    fn required_query(&self) -> ApiResult<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Query required".to_string()))
    }
}

/// One catalog search result
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogSearchResult {
    pub name: String,
    pub artist: String,
    pub url: String,
}

/// GET /api/search/spotify?query=...
///
/// Up to five tracks, in catalog order.
pub async fn search_spotify(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<CatalogSearchResult>>> {
    let query = params.required_query()?;

    let tracks = state.catalog.search_tracks(query, CATALOG_SEARCH_LIMIT).await?;

    Ok(Json(
        tracks
            .into_iter()
            .take(CATALOG_SEARCH_LIMIT)
            .map(|t| CatalogSearchResult {
                name: t.name,
                artist: t.artist,
                url: t.url,
            })
            .collect(),
    ))
}

/// GET /api/search/youtube?query=...
///
/// Music-category videos only.
pub async fn search_youtube(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<VideoHit>>> {
    let query = params.required_query()?;
    Ok(Json(state.videos.search_music_videos(query).await?))
}

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search/spotify", get(search_spotify))
        .route("/api/search/youtube", get(search_youtube))
}
