//! Service configuration resolution
//!
//! Credentials resolve with ENV → TOML priority. A credential found in more
//! than one place is logged as a warning. Missing credentials do not stop
//! startup; the affected provider reports it when called.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tunegrab_common::config::TomlConfig;

use crate::services::SpotifyCredentials;

pub const SPOTIFY_CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
pub const SPOTIFY_CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";
pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";

const DEFAULT_YTDLP: &str = "yt-dlp";
const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Runtime settings derived from environment and TOML
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub spotify: Option<SpotifyCredentials>,
    pub youtube_api_key: Option<String>,
    pub ytdlp_path: PathBuf,
    pub ffmpeg_path: PathBuf,
    /// Deadline for one download request (single track or whole batch)
    pub request_timeout: Option<Duration>,
}

fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Resolve one setting: environment first, then TOML
fn resolve_credential(label: &str, env_var: &str, toml_value: Option<&String>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_value(v));
    let toml_value = toml_value.filter(|v| is_valid_value(v)).cloned();

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in multiple sources: environment, TOML. Using environment (highest priority).",
            label
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", label);
        return Some(value);
    }

    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", label);
        return Some(value);
    }

    warn!("{} not configured (set {} or add it to config.toml)", label, env_var);
    None
}

impl ServiceConfig {
    pub fn resolve(toml: &TomlConfig) -> Self {
        let client_id = resolve_credential(
            "Spotify client id",
            SPOTIFY_CLIENT_ID_ENV,
            toml.spotify_client_id.as_ref(),
        );
        let client_secret = resolve_credential(
            "Spotify client secret",
            SPOTIFY_CLIENT_SECRET_ENV,
            toml.spotify_client_secret.as_ref(),
        );

        let spotify = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let youtube_api_key =
            resolve_credential("YouTube API key", YOUTUBE_API_KEY_ENV, toml.youtube_api_key.as_ref());

        Self {
            spotify,
            youtube_api_key,
            ytdlp_path: toml.ytdlp_path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_YTDLP)),
            ffmpeg_path: toml.ffmpeg_path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG)),
            request_timeout: toml.request_timeout_secs.map(Duration::from_secs),
        }
    }
}
