//! Cover art retrieval
//!
//! Catalog artwork is used untouched. Video thumbnails are 16:9, so they
//! are center-cropped to a square and re-encoded as JPEG before embedding.

use async_trait::async_trait;
use image::ImageFormat;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use crate::types::{ArtworkLookup, FetchError, ImageSource, MusicCatalog, ProviderError};

const USER_AGENT: &str = concat!("tunegrab/", env!("CARGO_PKG_VERSION"));

/// Where to get the cover for one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverArtRequest {
    /// Catalog album artwork
    Catalog(ArtworkLookup),
    /// Video thumbnail URL, cropped to square
    Thumbnail(String),
}

/// Center-crop to a square (side = shorter edge) and encode as JPEG
pub fn crop_to_square(data: &[u8]) -> Result<Vec<u8>, FetchError> {
    let img = image::load_from_memory(data).map_err(|e| FetchError::InvalidImage(e.to_string()))?;

    let (width, height) = (img.width(), img.height());
    let side = width.min(height);
    let left = (width - side) / 2;
    let top = (height - side) / 2;

    tracing::debug!(width, height, side, left, top, "Cropping thumbnail to square");

    // JPEG has no alpha channel
    let square = image::DynamicImage::ImageRgb8(img.crop_imm(left, top, side, side).to_rgb8());

    let mut output = Vec::new();
    square
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Jpeg)
        .map_err(|e| FetchError::InvalidImage(e.to_string()))?;

    Ok(output)
}

/// Plain HTTP image download
pub struct HttpImageSource {
    http_client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch_image(&self, url: &str) -> Result<Option<Vec<u8>>, FetchError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Some(bytes.to_vec()))
    }
}

/// Resolves a cover request to JPEG-ready bytes
#[derive(Clone)]
pub struct CoverArtFetcher {
    catalog: Arc<dyn MusicCatalog>,
    images: Arc<dyn ImageSource>,
}

impl CoverArtFetcher {
    pub fn new(catalog: Arc<dyn MusicCatalog>, images: Arc<dyn ImageSource>) -> Self {
        Self { catalog, images }
    }

    /// `Ok(None)` when the track simply has no artwork
    pub async fn fetch(&self, request: &CoverArtRequest) -> Result<Option<Vec<u8>>, FetchError> {
        match request {
            CoverArtRequest::Catalog(lookup) => {
                let url = match self.catalog.artwork_url(lookup).await {
                    Ok(Some(url)) => url,
                    Ok(None) | Err(ProviderError::NotFound(_)) => return Ok(None),
                    Err(e) => return Err(FetchError::Network(e.to_string())),
                };
                self.images.fetch_image(&url).await
            }
            CoverArtRequest::Thumbnail(url) => {
                let Some(data) = self.images.fetch_image(url).await? else {
                    return Ok(None);
                };
                let cropped = tokio::task::spawn_blocking(move || crop_to_square(&data))
                    .await
                    .map_err(|e| FetchError::InvalidImage(format!("crop task failed: {}", e)))??;
                Ok(Some(cropped))
            }
        }
    }
}
