//! Download workflow
//!
//! - `staging`: per-run staging directories and scoped file guards
//! - `pipeline`: resolve → fetch → transcode → tag for one track
//! - `batch`: sequential pipeline runs packaged into a ZIP archive
//!
//! Nothing produced here outlives the request that asked for it.

pub mod batch;
pub mod pipeline;
pub mod staging;

pub use batch::{BatchArchive, BatchOrchestrator};
pub use pipeline::{DownloadPipeline, DownloadedTrack};
pub use staging::{StagedFile, StagingArea};

use thiserror::Error;

use crate::services::{NotFound, TranscodeError};
use crate::types::FetchError;

/// Pipeline and batch failures
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    NotFound(#[from] NotFound),

    #[error("Download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Transcoding failed: {0}")]
    Transcode(#[from] TranscodeError),

    /// Rejected request (bad URL, unsupported format)
    #[error("{0}")]
    Validation(String),

    /// One track of a batch failed; no archive is produced
    #[error("Track {index} ({track}) failed: {source}")]
    Batch {
        /// 1-based position in the batch
        index: usize,
        track: String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Request timed out after {0} seconds")]
    TimedOut(u64),

    #[error("Failed to build archive: {0}")]
    Archive(String),

    #[error("Staging error: {0}")]
    Staging(#[from] std::io::Error),
}

impl PipelineError {
    /// Client-side errors (HTTP 400)
    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}
