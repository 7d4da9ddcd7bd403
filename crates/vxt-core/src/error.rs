//! Error types for vxt-core

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VxtError>;

#[derive(Error, Debug)]
pub enum VxtError {
    #[error("Tool lookup failed: {0}")]
    Tool(#[from] ToolError),

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("Output location error: {0}")]
    Output(#[from] OutputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error(
        "ffmpeg not found. Install it and add it to PATH, place it beside the \
         executable, or set VIDEO_XTRACTOR_FFMPEG to the binary or its directory"
    )]
    FfmpegNotFound,

    #[error(
        "yt-dlp not found. Install with: pip install yt-dlp, add it to PATH, \
         or set VIDEO_XTRACTOR_YTDLP to the binary or its directory"
    )]
    YtDlpNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(
        "Could not read the video's title/id from {url}. Some platforms require \
         cookies (see VIDEO_XTRACTOR_COOKIES_FROM_BROWSER). Detail: {detail}"
    )]
    Probe { url: String, detail: String },

    #[error("Metadata response was not a JSON object")]
    UnexpectedShape,

    #[error("Download failed with exit code {code:?}: {stderr}")]
    Download { code: Option<i32>, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("No downloaded media file found in {}", .0.display())]
    NoMediaFound(PathBuf),

    #[error("{step} failed after {attempts} attempt(s):\n{transcript}")]
    StepFailed {
        step: String,
        attempts: usize,
        transcript: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory {dir}: {source}")]
    CreateFailed {
        dir: String,
        source: std::io::Error,
    },

    #[error("No home directory available for the fallback output location")]
    NoHomeDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
