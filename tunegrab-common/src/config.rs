//! Configuration loading and temp folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the temp folder
pub const TEMP_DIR_ENV: &str = "TUNEGRAB_TEMP_DIR";

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Contents of `config.toml`
///
/// Every field is optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Staging folder for in-flight downloads
    pub temp_dir: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub youtube_api_key: Option<String>,
    /// yt-dlp executable (defaults to `yt-dlp` on PATH)
    pub ytdlp_path: Option<PathBuf>,
    /// ffmpeg executable (defaults to `ffmpeg` on PATH)
    pub ffmpeg_path: Option<PathBuf>,
    /// Per-request deadline; unset means no deadline
    pub request_timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`
    ///
    /// A missing file is not an error: defaults are returned with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        let config = Self::parse(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == Some(0) {
            return Err(Error::InvalidInput(
                "request_timeout_secs must be greater than zero (omit it to disable the deadline)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config file location: `<config dir>/tunegrab/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunegrab").join("config.toml"))
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub temp_dir: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        // ~/.cache/tunegrab on Linux, ~/Library/Caches/tunegrab on macOS,
        // %LOCALAPPDATA%\tunegrab on Windows
        let temp_dir = dirs::cache_dir()
            .map(|d| d.join("tunegrab"))
            .unwrap_or_else(|| std::env::temp_dir().join("tunegrab"));

        Self {
            temp_dir,
            log_level: default_log_level(),
        }
    }
}

/// Temp folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `TUNEGRAB_TEMP_DIR`
/// 3. `temp_dir` from the TOML file
/// 4. OS-dependent compiled default
pub struct TempDirResolver<'a> {
    cli_arg: Option<&'a Path>,
    toml: Option<&'a TomlConfig>,
}

impl<'a> TempDirResolver<'a> {
    pub fn new(cli_arg: Option<&'a Path>, toml: Option<&'a TomlConfig>) -> Self {
        Self { cli_arg, toml }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = self.cli_arg {
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(TEMP_DIR_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = self.toml.and_then(|t| t.temp_dir.as_ref()) {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().temp_dir
    }
}

/// Creates the temp folder on startup
pub struct TempDirInitializer {
    temp_dir: PathBuf,
}

impl TempDirInitializer {
    pub fn new(temp_dir: PathBuf) -> Self {
        Self { temp_dir }
    }

    /// Create the folder if missing (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.temp_dir)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.temp_dir
    }
}
