//! Service modules for the download pipeline
//!
//! Concrete collaborators (HTTP clients, subprocess wrappers) plus the
//! leaf components the pipeline composes: resolver, transcoder, cover art,
//! lyrics and tagging.

pub mod cover_art;
pub mod lyrics;
pub mod spotify_client;
pub mod tagger;
pub mod track_resolver;
pub mod transcoder;
pub mod youtube_client;
pub mod ytdlp;
pub mod ytmusic_client;

pub use cover_art::{crop_to_square, CoverArtFetcher, CoverArtRequest, HttpImageSource};
pub use lyrics::{LrclibClient, LyricsResolver};
pub use spotify_client::{parse_spotify_url, SpotifyClient, SpotifyCredentials, SpotifyLink};
pub use tagger::{TagError, Tagger};
pub use track_resolver::{NotFound, TrackRequest, TrackResolver};
pub use transcoder::{FfmpegTranscoder, TranscodeError};
pub use youtube_client::YouTubeClient;
pub use ytdlp::{is_direct_source_url, YtDlp};
pub use ytmusic_client::YtMusicClient;
