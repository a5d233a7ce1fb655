//! Output formats and their encoder profiles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    M4a,
    Flac,
}

/// Encoder settings for one output format
///
/// A profile fully determines the transcoder invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormatProfile {
    /// ffmpeg muxer name (`-f`)
    pub container: &'static str,
    /// ffmpeg encoder name (`-c:a`)
    pub codec: &'static str,
    /// Target bitrate (`-b:a`); lossless formats have none
    pub bitrate: Option<&'static str>,
    /// Encoder-specific arguments, passed verbatim
    pub encoder_params: &'static [&'static str],
    /// File extension (no dot)
    pub extension: &'static str,
    /// MIME type of the finished file
    pub mime_type: &'static str,
}

const MP3_PROFILE: AudioFormatProfile = AudioFormatProfile {
    container: "mp3",
    codec: "libmp3lame",
    bitrate: Some("320k"),
    encoder_params: &["-q:a", "0"],
    extension: "mp3",
    mime_type: "audio/mpeg",
};

const M4A_PROFILE: AudioFormatProfile = AudioFormatProfile {
    container: "mp4",
    codec: "aac",
    bitrate: Some("256k"),
    encoder_params: &["-q:a", "2"],
    extension: "m4a",
    mime_type: "audio/mp4",
};

const FLAC_PROFILE: AudioFormatProfile = AudioFormatProfile {
    container: "flac",
    codec: "flac",
    bitrate: None,
    encoder_params: &["-compression_level", "8"],
    extension: "flac",
    mime_type: "audio/flac",
};

impl AudioFormat {
    pub const ALL: [AudioFormat; 3] = [AudioFormat::Mp3, AudioFormat::M4a, AudioFormat::Flac];

    pub fn profile(self) -> &'static AudioFormatProfile {
        match self {
            AudioFormat::Mp3 => &MP3_PROFILE,
            AudioFormat::M4a => &M4A_PROFILE,
            AudioFormat::Flac => &FLAC_PROFILE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Flac => "flac",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected format string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid format '{0}' (expected one of: mp3, m4a, flac)")]
pub struct UnsupportedFormat(pub String);

impl FromStr for AudioFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AudioFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| UnsupportedFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_formats() {
        assert_eq!("mp3".parse::<AudioFormat>(), Ok(AudioFormat::Mp3));
        assert_eq!("m4a".parse::<AudioFormat>(), Ok(AudioFormat::M4a));
        assert_eq!("flac".parse::<AudioFormat>(), Ok(AudioFormat::Flac));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!("wav".parse::<AudioFormat>(), Err(UnsupportedFormat("wav".into())));
        assert!("MP3".parse::<AudioFormat>().is_err());
        assert!("".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn test_extension_matches_format_name() {
        for format in AudioFormat::ALL {
            assert_eq!(format.profile().extension, format.as_str());
        }
    }

    #[test]
    fn test_flac_is_lossless() {
        assert_eq!(AudioFormat::Flac.profile().bitrate, None);
        assert_eq!(AudioFormat::Mp3.profile().bitrate, Some("320k"));
        assert_eq!(AudioFormat::M4a.profile().container, "mp4");
    }
}
