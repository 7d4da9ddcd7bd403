//! Configuration management for video-xtractor

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a run, built once at startup and passed by reference into
/// the components that need them. Every field is optional; unset values
/// fall back to automatic behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for downloads (overrides the automatic choice)
    pub output_dir: Option<PathBuf>,
    /// Path to the ffmpeg binary or its containing directory
    pub ffmpeg: Option<PathBuf>,
    /// Path to the yt-dlp binary or its containing directory
    pub ytdlp: Option<PathBuf>,
    /// yt-dlp format selection expression
    pub format: Option<String>,
    /// Browser to read cookies from (e.g. "firefox", "chrome")
    pub cookies_from_browser: Option<String>,
    /// Netscape-format cookie file passed through to yt-dlp
    pub cookies_file: Option<PathBuf>,
    /// Custom User-Agent header for requests
    pub user_agent: Option<String>,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Merge order, later wins: defaults, then the config-dir file, then an
    /// explicitly specified file, then `VIDEO_XTRACTOR_*` environment
    /// variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(config_dir) = dirs::config_dir() {
            let default_config = config_dir.join("video-xtractor/config.toml");
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("VIDEO_XTRACTOR_"));

        let mut config: Config = figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;

        config.output_dir = config.output_dir.map(expand_tilde);
        config.ffmpeg = config.ffmpeg.map(expand_tilde);
        config.ytdlp = config.ytdlp.map(expand_tilde);
        config.cookies_file = config.cookies_file.map(expand_tilde);
        Ok(config)
    }
}

fn expand_tilde(path: PathBuf) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path
}
