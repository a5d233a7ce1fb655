//! Download pipeline
//!
//! Runs one track through
//! `Resolving → Fetching → Transcoding → Tagging → Ready`, dropping to
//! `Failed` on the first fatal error.
//!
//! # Error Handling
//! - Resolve, fetch and transcode failures are fatal
//! - Lyrics, cover art and tag writing failures are logged; the file is
//!   still returned
//! - The raw download is removed as soon as transcoding finishes, either way
//! - Everything else lives in the run's `StagingArea` and goes with it

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tunegrab_common::{sanitize_filename, track_file_stem};

use super::staging::{StagedFile, StagingArea};
use super::PipelineError;
use crate::models::{AudioFormat, MetadataBundle, PipelineRun, ResolvedTrack};
use crate::services::{
    parse_spotify_url, CoverArtFetcher, CoverArtRequest, LyricsResolver, SpotifyLink, Tagger, TrackRequest,
    TrackResolver,
};
use crate::types::{ArtworkLookup, MediaExtractor, Transcoder};

/// Finished file, still on disk inside its staging area
///
/// Dropping the handle deletes the file and its staging directory.
#[derive(Debug)]
pub struct DownloadedTrack {
    area: StagingArea,
    path: PathBuf,
    file_name: String,
    format: AudioFormat,
    run: PipelineRun,
}

impl DownloadedTrack {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Attachment / archive entry name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn run(&self) -> &PipelineRun {
        &self.run
    }

    pub fn staging_dir(&self) -> &Path {
        self.area.path()
    }

    /// Read the file into memory and remove everything from disk
    pub async fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        let data = tokio::fs::read(&self.path).await?;
        drop(self);
        Ok(data)
    }
}

/// Single-track download pipeline
pub struct DownloadPipeline {
    resolver: TrackResolver,
    extractor: Arc<dyn MediaExtractor>,
    transcoder: Arc<dyn Transcoder>,
    covers: CoverArtFetcher,
    lyrics: LyricsResolver,
    temp_root: PathBuf,
}

impl DownloadPipeline {
    pub fn new(
        resolver: TrackResolver,
        extractor: Arc<dyn MediaExtractor>,
        transcoder: Arc<dyn Transcoder>,
        covers: CoverArtFetcher,
        lyrics: LyricsResolver,
        temp_root: PathBuf,
    ) -> Self {
        Self {
            resolver,
            extractor,
            transcoder,
            covers,
            lyrics,
            temp_root,
        }
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Download, transcode and tag one track
    pub async fn run(&self, request: &TrackRequest, format: AudioFormat) -> Result<DownloadedTrack, PipelineError> {
        let mut run = PipelineRun::new();

        tracing::info!(run_id = %run.run_id, request = %request.label(), format = %format, "Pipeline run started");

        match self.execute(&mut run, request, format).await {
            Ok((area, path)) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                tracing::info!(
                    run_id = %run.run_id,
                    path = %path.display(),
                    state = ?run.state,
                    "Pipeline run complete"
                );

                Ok(DownloadedTrack {
                    area,
                    path,
                    file_name,
                    format,
                    run,
                })
            }
            Err(e) => {
                let failed_in = run.state;
                run.fail();
                tracing::warn!(run_id = %run.run_id, state = ?failed_in, error = %e, "Pipeline run failed");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        run: &mut PipelineRun,
        request: &TrackRequest,
        format: AudioFormat,
    ) -> Result<(StagingArea, PathBuf), PipelineError> {
        // Resolving
        let resolved = self.resolver.resolve(request).await?;
        run.advance();

        // Fetching
        let area = StagingArea::create(&self.temp_root, run.run_id).await?;
        let stem = area.join(format!("{}_temp", sanitize_filename(&resolved.reference.name)));
        let raw = StagedFile::new(self.extractor.fetch_audio(&resolved.source, &stem).await?);
        run.advance();

        // Transcoding
        let profile = format.profile();
        let (name, artist) = (&resolved.reference.name, &resolved.reference.artist);
        let mut output = area.join(format!("{}.{}", track_file_stem(name, artist), profile.extension));
        if output == raw.path() {
            output = area.join(format!("{} (1).{}", track_file_stem(name, artist), profile.extension));
        }

        let transcoded = self.transcoder.transcode(raw.path(), &output, profile).await;
        drop(raw);
        transcoded?;
        run.advance();

        // Tagging
        let bundle = self.enrich(&resolved).await;
        let tagger = Tagger::for_format(format);
        let tag_path = output.clone();

        match tokio::task::spawn_blocking(move || tagger.apply(&tag_path, &bundle)).await {
            Ok(Ok(())) => tracing::debug!(run_id = %run.run_id, path = %output.display(), "Tags written"),
            Ok(Err(e)) => {
                tracing::warn!(run_id = %run.run_id, path = %output.display(), error = %e, "Tagging failed, returning untagged file")
            }
            Err(e) => tracing::warn!(run_id = %run.run_id, error = %e, "Tagging task failed"),
        }
        run.advance();

        Ok((area, output))
    }

    /// Lyrics and cover art, looked up concurrently; both optional
    async fn enrich(&self, resolved: &ResolvedTrack) -> MetadataBundle {
        let reference = &resolved.reference;
        let cover_request = cover_request_for(resolved);

        let (lyrics, cover) = tokio::join!(
            self.lyrics.resolve(&reference.artist, &reference.name),
            self.covers.fetch(&cover_request),
        );

        let cover = match cover {
            Ok(cover) => cover,
            Err(e) => {
                tracing::warn!(track = %reference.name, artist = %reference.artist, error = %e, "Cover art lookup failed");
                None
            }
        };

        MetadataBundle::new(reference.artist.clone(), reference.name.clone())
            .with_lyrics(lyrics)
            .with_cover(cover)
    }
}

/// Thumbnail for direct URLs; catalog artwork (by id when known) otherwise
fn cover_request_for(resolved: &ResolvedTrack) -> CoverArtRequest {
    if let Some(thumbnail) = &resolved.thumbnail_url {
        return CoverArtRequest::Thumbnail(thumbnail.clone());
    }

    let reference = &resolved.reference;
    match reference.source_url.as_deref().and_then(parse_spotify_url) {
        Some(SpotifyLink::Track(id)) => CoverArtRequest::Catalog(ArtworkLookup::TrackId(id)),
        _ => CoverArtRequest::Catalog(ArtworkLookup::Query(reference.search_query())),
    }
}
