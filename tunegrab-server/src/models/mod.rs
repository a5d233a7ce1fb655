//! Data models for tunegrab-server
//!
//! - Track references and resolved sources
//! - Output formats and encoder profiles
//! - Metadata bundles
//! - Download pipeline state machine

pub mod format;
pub mod metadata;
pub mod pipeline_run;
pub mod track;

pub use format::{AudioFormat, AudioFormatProfile, UnsupportedFormat};
pub use metadata::MetadataBundle;
pub use pipeline_run::{PipelineRun, PipelineState, StateTransition};
pub use track::{ResolvedSource, ResolvedTrack, SourceKind, TrackReference};
