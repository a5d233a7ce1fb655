//! ffmpeg audio transcoder
//!
//! ffmpeg writes into a hidden partial file next to the destination. The
//! partial file is renamed onto the destination only after ffmpeg exits
//! cleanly and symphonia can open the result as an audio stream.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tokio::process::Command;

use crate::models::AudioFormatProfile;
use crate::types::Transcoder;

/// Transcoding errors
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Failed to start ffmpeg: {0}")]
    Spawn(String),

    #[error("ffmpeg failed (exit code {code:?}): {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    /// ffmpeg succeeded but the output is not decodable audio
    #[error("Transcoded output is not valid audio: {0}")]
    InvalidOutput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sibling path ffmpeg writes to before the output is verified
pub fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{}.partial", name))
}

/// ffmpeg argument list for one transcode
pub fn build_args(input: &Path, output: &Path, profile: &AudioFormatProfile) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(input.to_string_lossy().into_owned());
    args.extend(["-vn", "-c:a", profile.codec].iter().map(|s| s.to_string()));
    if let Some(bitrate) = profile.bitrate {
        args.push("-b:a".to_string());
        args.push(bitrate.to_string());
    }
    args.extend(profile.encoder_params.iter().map(|s| s.to_string()));
    args.push("-f".to_string());
    args.push(profile.container.to_string());
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Check that `path` opens as an audio stream with a usable decoder
///
/// Blocking; call from `spawn_blocking`.
pub fn verify_output(path: &Path, extension: &str) -> Result<(), TranscodeError> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| TranscodeError::InvalidOutput(format!("probe failed: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| TranscodeError::InvalidOutput("no audio track".to_string()))?;

    symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| TranscodeError::InvalidOutput(format!("no decoder: {}", e)))?;

    format
        .next_packet()
        .map_err(|e| TranscodeError::InvalidOutput(format!("no audio packets: {}", e)))?;

    Ok(())
}

/// ffmpeg wrapper
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    async fn encode_and_verify(
        &self,
        input: &Path,
        partial: &Path,
        profile: &AudioFormatProfile,
    ) -> Result<(), TranscodeError> {
        let output = Command::new(&self.binary)
            .args(build_args(input, partial, profile))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TranscodeError::Spawn(e.to_string()))?;

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let check_path = partial.to_path_buf();
        let extension = profile.extension;
        tokio::task::spawn_blocking(move || verify_output(&check_path, extension))
            .await
            .map_err(|e| TranscodeError::InvalidOutput(format!("verification task failed: {}", e)))?
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        profile: &AudioFormatProfile,
    ) -> Result<(), TranscodeError> {
        let partial = partial_path(output);

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            codec = profile.codec,
            bitrate = profile.bitrate.unwrap_or("lossless"),
            "Transcoding"
        );

        let result = match self.encode_and_verify(input, &partial, profile).await {
            Ok(()) => tokio::fs::rename(&partial, output).await.map_err(TranscodeError::from),
            Err(e) => Err(e),
        };

        if result.is_err() && partial.exists() {
            if let Err(e) = tokio::fs::remove_file(&partial).await {
                tracing::warn!(path = %partial.display(), error = %e, "Failed to remove partial output");
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioFormat;
    use tempfile::TempDir;

    fn write_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..4410 {
            let sample = ((i as f32 * 0.05).sin() * 8000.0) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_mp3_args() {
        let args = build_args(
            Path::new("/run/raw.webm"),
            Path::new("/run/out.partial"),
            AudioFormat::Mp3.profile(),
        );
        assert_eq!(
            args,
            vec![
                "-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i", "/run/raw.webm", "-vn", "-c:a",
                "libmp3lame", "-b:a", "320k", "-q:a", "0", "-f", "mp3", "/run/out.partial",
            ]
        );
    }

    #[test]
    fn test_flac_args_have_no_bitrate() {
        let args = build_args(Path::new("in"), Path::new("out"), AudioFormat::Flac.profile());
        assert!(!args.iter().any(|a| a == "-b:a"));
        let tail: Vec<&str> = args.iter().rev().take(6).rev().map(String::as_str).collect();
        assert_eq!(tail, vec!["flac", "-compression_level", "8", "-f", "flac", "out"]);
    }

    #[test]
    fn test_partial_path_is_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("/run/Artist - Song.mp3")),
            PathBuf::from("/run/.Artist - Song.mp3.partial")
        );
    }

    #[test]
    fn test_verify_accepts_real_audio() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.partial");
        write_wav(&path);
        assert!(verify_output(&path, "wav").is_ok());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.partial");
        std::fs::write(&path, b"this is not audio at all").unwrap();
        assert!(matches!(
            verify_output(&path, "mp3"),
            Err(TranscodeError::InvalidOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.wav");
        let output = dir.path().join("out.mp3");
        write_wav(&input);

        let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg");
        let err = transcoder
            .transcode(&input, &output, AudioFormat::Mp3.profile())
            .await
            .unwrap_err();

        assert!(matches!(err, TranscodeError::Spawn(_)));
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }
}
