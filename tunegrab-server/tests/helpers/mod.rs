//! Shared test helpers: fake collaborators and audio fixtures
//!
//! Fakes count their calls so tests can assert that validation happens
//! before any provider or pipeline work.

#![allow(dead_code)]

use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use tunegrab_server::models::{AudioFormatProfile, ResolvedSource, TrackReference};
use tunegrab_server::services::TranscodeError;
use tunegrab_server::types::{
    ArtworkLookup, CatalogCollection, CatalogTrack, FetchError, ImageSource, LyricsProvider, MediaExtractor,
    MediaInfo, MusicCatalog, ProviderError, SongHit, SongSearch, Transcoder, VideoHit, VideoSearch,
};
use tunegrab_server::{AppState, Collaborators};

// ============================================================================
// Fixtures
// ============================================================================

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, no padding: 417-byte frames
pub fn mp3_fixture() -> Vec<u8> {
    let mut data = Vec::with_capacity(417 * 10);
    for _ in 0..10 {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        data.extend_from_slice(&frame);
    }
    data
}

/// FLAC stream with STREAMINFO (44.1 kHz, stereo, 16-bit) and a trailing
/// PADDING block, the block layout ffmpeg writes
pub fn flac_fixture() -> Vec<u8> {
    let mut data = b"fLaC".to_vec();
    // Type 0 (STREAMINFO), length 34, not last
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x22]);
    // Min/max block size 4096, min/max frame size unknown
    data.extend_from_slice(&[0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    // Sample rate / channels / bits per sample / total samples
    data.extend_from_slice(&[0x0A, 0xC4, 0x42, 0xF0, 0x00, 0x00, 0x00, 0x00]);
    // MD5
    data.extend_from_slice(&[0u8; 16]);
    // Last-metadata-block flag + type 1 (PADDING), length 16
    data.extend_from_slice(&[0x81, 0x00, 0x00, 0x10]);
    data.extend_from_slice(&[0u8; 16]);
    data
}

fn mp4_atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut atom = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    atom.extend_from_slice(kind);
    atom.extend_from_slice(body);
    atom
}

/// Untagged M4A: `ftyp`, then `moov.trak.mdia` with a sound handler, then
/// an empty `mdat`
pub fn m4a_fixture() -> Vec<u8> {
    let ftyp = mp4_atom(b"ftyp", b"M4A \0\0\0\0M4A isom");

    let mut mdhd = vec![0u8; 12]; // version/flags, creation, modification
    mdhd.extend_from_slice(&44_100u32.to_be_bytes()); // timescale
    mdhd.extend_from_slice(&0u32.to_be_bytes()); // duration
    mdhd.extend_from_slice(&[0x55, 0xC4, 0x00, 0x00]); // language "und", pre-defined

    let mut hdlr = vec![0u8; 8]; // version/flags, pre-defined
    hdlr.extend_from_slice(b"soun");
    hdlr.extend_from_slice(&[0u8; 12]); // reserved
    hdlr.push(0); // empty name

    let mdia = mp4_atom(b"mdia", &[mp4_atom(b"mdhd", &mdhd), mp4_atom(b"hdlr", &hdlr)].concat());
    let moov = mp4_atom(b"moov", &mp4_atom(b"trak", &mdia));

    [ftyp, moov, mp4_atom(b"mdat", &[])].concat()
}

/// Small JPEG used as cover art
pub fn jpeg_fixture() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 30, 30]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .unwrap();
    out
}

pub fn write_fixture(path: &Path, data: &[u8]) {
    std::fs::write(path, data).unwrap();
}

/// Entries left under the temp root
pub fn temp_root_entries(root: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(root)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
pub struct FakeCatalog {
    pub search_results: Vec<CatalogTrack>,
    pub collection: Vec<TrackReference>,
    pub artwork: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MusicCatalog for FakeCatalog {
    async fn search_tracks(&self, _query: &str, _limit: usize) -> Result<Vec<CatalogTrack>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.search_results.clone())
    }

    async fn track(&self, track_id: &str) -> Result<CatalogTrack, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CatalogTrack {
            id: track_id.to_string(),
            name: "Silence".to_string(),
            artist: "Delerium".to_string(),
            url: format!("https://open.spotify.com/track/{}", track_id),
        })
    }

    async fn collection_tracks(&self, _collection: &CatalogCollection) -> Result<Vec<TrackReference>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.collection.clone())
    }

    async fn artwork_url(&self, _lookup: &ArtworkLookup) -> Result<Option<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.artwork.clone())
    }
}

#[derive(Default)]
pub struct FakeVideos {
    pub results: Vec<VideoHit>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl VideoSearch for FakeVideos {
    async fn search_music_videos(&self, _query: &str) -> Result<Vec<VideoHit>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.clone())
    }
}

/// Returns a hit whose video id is the query itself
#[derive(Default)]
pub struct FakeSongs {
    pub empty: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl SongSearch for FakeSongs {
    async fn first_song(&self, query: &str) -> Result<Option<SongHit>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.empty {
            return Ok(None);
        }
        Ok(Some(SongHit {
            video_id: query.replace(' ', "_"),
            title: None,
        }))
    }
}

/// Writes `<stem>.webm` with dummy bytes
#[derive(Default)]
pub struct FakeExtractor {
    pub fail_fetch: bool,
    pub fetch_delay: Option<Duration>,
    pub thumbnail: Option<String>,
    pub probes: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl FakeExtractor {
    pub fn calls(&self) -> usize {
        self.probes.load(Ordering::SeqCst) + self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaExtractor for FakeExtractor {
    async fn probe(&self, url: &str) -> Result<MediaInfo, FetchError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(MediaInfo {
            id: url.to_string(),
            title: "Live Session".to_string(),
            uploader: Some("Some Band".to_string()),
            thumbnail: self.thumbnail.clone(),
        })
    }

    async fn fetch_audio(&self, _source: &ResolvedSource, stem: &Path) -> Result<PathBuf, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let path = PathBuf::from(format!("{}.webm", stem.display()));
        tokio::fs::write(&path, b"raw webm bytes").await?;

        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_fetch {
            tokio::fs::remove_file(&path).await?;
            return Err(FetchError::ToolFailed {
                tool: "yt-dlp",
                code: Some(1),
                stderr: "Video unavailable".to_string(),
            });
        }
        Ok(path)
    }
}

/// Writes a format-appropriate fixture; fails on the configured call
#[derive(Default)]
pub struct FakeTranscoder {
    /// 1-based call number that fails
    pub fail_on_call: Option<usize>,
    pub calls: AtomicUsize,
    pub inputs: std::sync::Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        profile: &AudioFormatProfile,
    ) -> Result<(), TranscodeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.inputs.lock().unwrap().push(input.to_path_buf());

        if !input.exists() {
            return Err(TranscodeError::Failed {
                code: Some(1),
                stderr: format!("{}: No such file or directory", input.display()),
            });
        }

        if self.fail_on_call == Some(call) {
            return Err(TranscodeError::Failed {
                code: Some(1),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }

        let data = match profile.extension {
            "mp3" => mp3_fixture(),
            "flac" => flac_fixture(),
            _ => b"not really mp4".to_vec(),
        };
        tokio::fs::write(output, data).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeLyrics {
    pub synced: Option<String>,
    pub plain: Option<String>,
    pub fail: bool,
}

#[async_trait]
impl LyricsProvider for FakeLyrics {
    async fn synced_lyrics(&self, _artist: &str, _title: &str) -> Result<Option<String>, ProviderError> {
        if self.fail {
            return Err(ProviderError::Network("lyrics service down".to_string()));
        }
        Ok(self.synced.clone())
    }

    async fn plain_lyrics(&self, _artist: &str, _title: &str) -> Result<Option<String>, ProviderError> {
        if self.fail {
            return Err(ProviderError::Network("lyrics service down".to_string()));
        }
        Ok(self.plain.clone())
    }
}

#[derive(Default)]
pub struct FakeImages {
    pub data: Option<Vec<u8>>,
}

#[async_trait]
impl ImageSource for FakeImages {
    async fn fetch_image(&self, _url: &str) -> Result<Option<Vec<u8>>, FetchError> {
        Ok(self.data.clone())
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Fakes wired into an `AppState` over a fresh temp root
pub struct TestHarness {
    pub temp: TempDir,
    pub catalog: Arc<FakeCatalog>,
    pub videos: Arc<FakeVideos>,
    pub songs: Arc<FakeSongs>,
    pub extractor: Arc<FakeExtractor>,
    pub transcoder: Arc<FakeTranscoder>,
    pub lyrics: Arc<FakeLyrics>,
    pub images: Arc<FakeImages>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    pub fn temp_root(&self) -> &Path {
        self.temp.path()
    }

    pub fn state(&self, request_timeout: Option<Duration>) -> AppState {
        AppState::new(
            Collaborators {
                catalog: self.catalog.clone(),
                videos: self.videos.clone(),
                songs: self.songs.clone(),
                extractor: self.extractor.clone(),
                transcoder: self.transcoder.clone(),
                lyrics: self.lyrics.clone(),
                images: self.images.clone(),
            },
            self.temp.path().to_path_buf(),
            request_timeout,
        )
    }

    /// Calls made to anything that does pipeline or provider work
    pub fn work_calls(&self) -> usize {
        self.catalog.calls()
            + self.videos.calls.load(Ordering::SeqCst)
            + self.songs.calls.load(Ordering::SeqCst)
            + self.extractor.calls()
            + self.transcoder.calls.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct TestHarnessBuilder {
    pub catalog: FakeCatalog,
    pub videos: FakeVideos,
    pub songs: FakeSongs,
    pub extractor: FakeExtractor,
    pub transcoder: FakeTranscoder,
    pub lyrics: FakeLyrics,
    pub images: FakeImages,
}

impl TestHarnessBuilder {
    pub fn catalog(mut self, catalog: FakeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn videos(mut self, videos: FakeVideos) -> Self {
        self.videos = videos;
        self
    }

    pub fn songs(mut self, songs: FakeSongs) -> Self {
        self.songs = songs;
        self
    }

    pub fn extractor(mut self, extractor: FakeExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn transcoder(mut self, transcoder: FakeTranscoder) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn lyrics(mut self, lyrics: FakeLyrics) -> Self {
        self.lyrics = lyrics;
        self
    }

    pub fn images(mut self, images: FakeImages) -> Self {
        self.images = images;
        self
    }

    pub fn build(self) -> TestHarness {
        TestHarness {
            temp: TempDir::new().unwrap(),
            catalog: Arc::new(self.catalog),
            videos: Arc::new(self.videos),
            songs: Arc::new(self.songs),
            extractor: Arc::new(self.extractor),
            transcoder: Arc::new(self.transcoder),
            lyrics: Arc::new(self.lyrics),
            images: Arc::new(self.images),
        }
    }
}
