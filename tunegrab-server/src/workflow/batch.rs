//! Batch orchestrator
//!
//! Runs the pipeline over a list of tracks one after another and packs the
//! results into an in-memory ZIP (stored, not deflated; audio does not
//! compress). Each file is deleted from disk as soon as it is in the
//! archive. The first failure aborts the batch and no archive is returned.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::pipeline::DownloadPipeline;
use super::PipelineError;
use crate::models::{AudioFormat, TrackReference};
use crate::services::TrackRequest;

/// Finished archive
#[derive(Debug)]
pub struct BatchArchive {
    pub data: Vec<u8>,
    /// Entry names in archive order
    pub entries: Vec<String>,
}

/// Pick an entry name not yet used in this archive
///
/// `Song.mp3`, `Song (1).mp3`, `Song (2).mp3`, ...
fn unique_entry_name(used: &mut HashSet<String>, name: &str) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let path = Path::new(name);
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let extension = path.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();

    let mut n = 1;
    loop {
        let candidate = format!("{} ({}){}", stem, n, extension);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[derive(Clone)]
pub struct BatchOrchestrator {
    pipeline: Arc<DownloadPipeline>,
}

impl BatchOrchestrator {
    pub fn new(pipeline: Arc<DownloadPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self, tracks: &[TrackReference], format: AudioFormat) -> Result<BatchArchive, PipelineError> {
        let archive_err = |e: zip::result::ZipError| PipelineError::Archive(e.to_string());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut used = HashSet::new();
        let mut entries = Vec::with_capacity(tracks.len());

        tracing::info!(tracks = tracks.len(), format = %format, "Batch started");

        for (i, track) in tracks.iter().enumerate() {
            let index = i + 1;
            let request = TrackRequest::Catalog(track.clone());

            let batch_err = |source: PipelineError| PipelineError::Batch {
                index,
                track: request.label(),
                source: Box::new(source),
            };

            let downloaded = self.pipeline.run(&request, format).await.map_err(batch_err)?;
            let entry = unique_entry_name(&mut used, downloaded.file_name());
            let data = downloaded
                .into_bytes()
                .await
                .map_err(|e| batch_err(PipelineError::Staging(e)))?;

            writer.start_file(entry.clone(), options).map_err(archive_err)?;
            writer
                .write_all(&data)
                .map_err(|e| PipelineError::Archive(e.to_string()))?;

            tracing::info!(index, total = tracks.len(), entry = %entry, bytes = data.len(), "Added track to archive");
            entries.push(entry);
        }

        let data = writer.finish().map_err(archive_err)?.into_inner();

        tracing::info!(entries = entries.len(), bytes = data.len(), "Batch complete");

        Ok(BatchArchive { data, entries })
    }
}
