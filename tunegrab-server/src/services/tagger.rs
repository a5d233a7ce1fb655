//! Metadata tagger
//!
//! One variant per container, chosen through `TAGGERS`. Every variant goes
//! through lofty's generic `Tag`, created with the container's native tag
//! type so artist/title/lyrics/cover land on the native keys:
//!
//! | Variant | Artist | Title | Lyrics | Cover |
//! |---------|--------|-------|--------|-------|
//! | Id3v2   | TPE1   | TIT2  | USLT   | APIC (front cover) |
//! | Mp4     | ©ART   | ©nam  | ©lyr   | covr (untyped) |
//! | Vorbis  | ARTIST | TITLE | LYRICS | PICTURE block (front cover) |
//!
//! Tag I/O is blocking; callers run `apply` on the blocking pool.

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagType};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

use crate::models::{AudioFormat, MetadataBundle};

/// Tag writing errors (non-fatal for the pipeline)
#[derive(Debug, Error)]
pub enum TagError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("No writable {0:?} tag")]
    NoTag(TagType),

    #[error("Failed to write tags to {path}: {message}")]
    Write { path: String, message: String },
}

/// Tag writing strategy for one container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tagger {
    Id3v2,
    Mp4,
    Vorbis,
}

/// Output format → tagger
const TAGGERS: [(AudioFormat, Tagger); 3] = [
    (AudioFormat::Mp3, Tagger::Id3v2),
    (AudioFormat::M4a, Tagger::Mp4),
    (AudioFormat::Flac, Tagger::Vorbis),
];

impl Tagger {
    pub fn for_format(format: AudioFormat) -> Tagger {
        TAGGERS
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, tagger)| *tagger)
            // Every AudioFormat has a row
            .unwrap_or(Tagger::Id3v2)
    }

    fn file_type(self) -> FileType {
        match self {
            Tagger::Id3v2 => FileType::Mpeg,
            Tagger::Mp4 => FileType::Mp4,
            Tagger::Vorbis => FileType::Flac,
        }
    }

    pub fn tag_type(self) -> TagType {
        match self {
            Tagger::Id3v2 => TagType::Id3v2,
            Tagger::Mp4 => TagType::Mp4Ilst,
            Tagger::Vorbis => TagType::VorbisComments,
        }
    }

    /// MP4 `covr` atoms carry no picture role
    fn cover_type(self) -> PictureType {
        match self {
            Tagger::Id3v2 | Tagger::Vorbis => PictureType::CoverFront,
            Tagger::Mp4 => PictureType::Other,
        }
    }

    /// Write `bundle` into the file at `path`, in place
    ///
    /// A file without a tag gets a fresh one of the native type.
    pub fn apply(self, path: &Path, bundle: &MetadataBundle) -> Result<(), TagError> {
        let path_str = path.display().to_string();
        let read_err = |message: String| TagError::Read {
            path: path_str.clone(),
            message,
        };

        let file = File::open(path).map_err(|e| read_err(e.to_string()))?;
        let mut tagged_file = Probe::with_file_type(BufReader::new(file), self.file_type())
            .read()
            .map_err(|e| read_err(e.to_string()))?;

        let tag_type = self.tag_type();
        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file.tag_mut(tag_type).ok_or(TagError::NoTag(tag_type))?;

        tag.set_artist(bundle.artist.clone());
        tag.set_title(bundle.title.clone());

        if let Some(lyrics) = &bundle.lyrics {
            tag.insert_text(ItemKey::Lyrics, lyrics.clone());
        }

        if let Some(cover) = &bundle.cover {
            let cover_type = self.cover_type();
            tag.remove_picture_type(cover_type);
            tag.push_picture(Picture::new_unchecked(
                cover_type,
                Some(MimeType::Jpeg),
                None,
                cover.clone(),
            ));
        }

        tracing::debug!(
            path = %path.display(),
            tagger = ?self,
            lyrics = bundle.lyrics.is_some(),
            cover = bundle.cover.is_some(),
            "Writing tags"
        );

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|e| TagError::Write {
                path: path_str.clone(),
                message: e.to_string(),
            })
    }
}
