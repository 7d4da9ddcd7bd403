//! Locating the external ffmpeg and yt-dlp binaries

use crate::config::Config;
use crate::error::ToolError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Find ffmpeg: configured location first, then `ffmpeg/bin/` and plain
/// `ffmpeg` beside the executable and under the working directory, then
/// the system PATH.
pub fn find_ffmpeg(config: &Config) -> Result<PathBuf, ToolError> {
    find_tool("ffmpeg", config.ffmpeg.as_deref()).ok_or(ToolError::FfmpegNotFound)
}

/// Find yt-dlp with the same candidate order as [`find_ffmpeg`].
pub fn find_ytdlp(config: &Config) -> Result<PathBuf, ToolError> {
    find_tool("yt-dlp", config.ytdlp.as_deref()).ok_or(ToolError::YtDlpNotFound)
}

fn find_tool(name: &str, configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(configured) = configured {
        if let Some(path) = resolve_override(configured, name) {
            debug!("Using configured {} at {}", name, path.display());
            return Some(path);
        }
        warn!(
            "Configured {} location {} does not exist, searching instead",
            name,
            configured.display()
        );
    }

    let binary = platform_exe(name);
    for base in search_bases() {
        for candidate in [
            base.join(name).join("bin").join(&binary),
            base.join(&binary),
        ] {
            if candidate.is_file() {
                debug!("Found {} at {}", name, candidate.display());
                return Some(candidate);
            }
        }
    }

    which::which(name).ok()
}

/// A configured path may be the binary itself or its containing directory.
fn resolve_override(configured: &Path, name: &str) -> Option<PathBuf> {
    if configured.is_file() {
        return Some(configured.to_path_buf());
    }
    if configured.is_dir() {
        let nested = configured.join(platform_exe(name));
        if nested.is_file() {
            return Some(nested);
        }
    }
    None
}

fn search_bases() -> Vec<PathBuf> {
    let mut bases = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            bases.push(dir.to_path_buf());
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        bases.push(cwd);
    }
    bases
}

fn platform_exe(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}
