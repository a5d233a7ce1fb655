//! yt-dlp media extractor
//!
//! Metadata probing and best-audio download for direct-source URLs.
//! Every invocation is a child process spawned with `kill_on_drop`, so a
//! cancelled request does not leave a download running.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::models::ResolvedSource;
use crate::types::{FetchError, MediaExtractor, MediaInfo};

const TOOL: &str = "yt-dlp";

/// Hosts whose URLs are fetched directly instead of being searched for
const DIRECT_SOURCE_DOMAINS: &[&str] = &["youtube.com", "youtu.be", "music.youtube.com"];

/// True for http(s) URLs on a direct-source domain (subdomains included)
pub fn is_direct_source_url(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_lowercase();
    DIRECT_SOURCE_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

/// yt-dlp wrapper
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<String, FetchError> {
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FetchError::Spawn {
                tool: TOOL,
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(stderr = %stderr, "yt-dlp stderr");
            return Err(FetchError::ToolFailed {
                tool: TOOL,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Files in the stem's directory named `<stem file name>.<anything>`
async fn files_for_stem(stem: &Path) -> Vec<PathBuf> {
    let (Some(dir), Some(prefix)) = (stem.parent(), stem.file_name().and_then(|n| n.to_str())) else {
        return Vec::new();
    };
    let prefix = format!("{}.", prefix);

    let mut found = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return found;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            found.push(entry.path());
        }
    }
    found
}

async fn remove_partials(stem: &Path) {
    for path in files_for_stem(stem).await {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial download");
        }
    }
}

/// Final path printed by `--print after_move:filepath` (last non-empty line)
fn printed_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(PathBuf::from)
}

#[async_trait]
impl MediaExtractor for YtDlp {
    async fn probe(&self, url: &str) -> Result<MediaInfo, FetchError> {
        tracing::debug!(url = %url, "Probing media metadata");

        let stdout = self
            .run(&["--dump-single-json", "--no-playlist", "--skip-download", "--no-warnings", url])
            .await?;

        serde_json::from_str(&stdout).map_err(|e| FetchError::Parse(format!("yt-dlp JSON: {}", e)))
    }

    async fn fetch_audio(&self, source: &ResolvedSource, stem: &Path) -> Result<PathBuf, FetchError> {
        let template = format!("{}.%(ext)s", stem.display());

        tracing::info!(locator = %source.locator, stem = %stem.display(), "Fetching audio stream");

        let result = self
            .run(&[
                "-f",
                "bestaudio/best",
                "--no-playlist",
                "--no-progress",
                "--no-warnings",
                "-o",
                &template,
                "--print",
                "after_move:filepath",
                "--no-simulate",
                &source.locator,
            ])
            .await;

        let stdout = match result {
            Ok(stdout) => stdout,
            Err(e) => {
                remove_partials(stem).await;
                return Err(e);
            }
        };

        if let Some(path) = printed_path(&stdout).filter(|p| p.is_file()) {
            return Ok(path);
        }

        // Older yt-dlp builds do not support after_move printing
        match files_for_stem(stem).await.into_iter().find(|p| {
            p.extension().map(|e| e != "part" && e != "ytdl").unwrap_or(false)
        }) {
            Some(path) => Ok(path),
            None => {
                remove_partials(stem).await;
                Err(FetchError::MissingOutput(stem.to_path_buf()))
            }
        }
    }
}
