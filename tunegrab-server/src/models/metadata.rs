//! Metadata written into finished files

/// Enrichment payload consumed by the tagger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataBundle {
    pub artist: String,
    pub title: String,
    /// Synced (LRC) or plain lyrics
    pub lyrics: Option<String>,
    /// JPEG image data
    pub cover: Option<Vec<u8>>,
}

impl MetadataBundle {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            lyrics: None,
            cover: None,
        }
    }

    pub fn with_lyrics(mut self, lyrics: Option<String>) -> Self {
        self.lyrics = lyrics.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn with_cover(mut self, cover: Option<Vec<u8>>) -> Self {
        self.cover = cover.filter(|c| !c.is_empty());
        self
    }
}
