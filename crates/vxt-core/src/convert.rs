//! The fixed ffmpeg derivative pipeline

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// Nominal stage count per video: the download plus the six conversions.
pub const TOTAL_STEPS: u32 = 7;

/// Extensions yt-dlp plausibly leaves behind for a merged download.
const MEDIA_EXTENSIONS: [&str; 6] = ["mp4", "mkv", "webm", "mov", "m4v", "flv"];

/// One pipeline step: an output file plus the ffmpeg argument lists to try
/// for it, in order. The first invocation that succeeds wins.
#[derive(Debug, Clone)]
pub struct ConvertStep {
    pub description: &'static str,
    pub index: u32,
    pub input: PathBuf,
    pub output: PathBuf,
    pub attempts: Vec<&'static [&'static str]>,
}

/// Where the intermediate audio lands while the audio derivatives are cut.
pub fn temp_audio_path(dir: &Path, base_name: &str) -> PathBuf {
    dir.join(format!("{base_name}_TEMP_AUDIO.m4a"))
}

/// The six conversion steps, in their fixed order.
pub fn plan_steps(dir: &Path, base_name: &str, source: &Path) -> Vec<ConvertStep> {
    let temp_audio = temp_audio_path(dir, base_name);

    vec![
        ConvertStep {
            description: "Extracting temporary audio",
            index: 1,
            input: source.to_path_buf(),
            output: temp_audio.clone(),
            attempts: vec![&["-vn", "-c:a", "aac", "-b:a", "192k"]],
        },
        ConvertStep {
            description: "Creating MP3 file",
            index: 2,
            input: temp_audio.clone(),
            output: dir.join(format!("{base_name}_AUDIO.mp3")),
            attempts: vec![
                &["-c:a", "libmp3lame", "-q:a", "0"],
                &["-c:a", "mp3", "-q:a", "0"],
            ],
        },
        ConvertStep {
            description: "Creating FLAC file",
            index: 3,
            input: temp_audio.clone(),
            output: dir.join(format!("{base_name}_AUDIO.flac")),
            attempts: vec![&["-c:a", "flac"]],
        },
        ConvertStep {
            description: "Creating AAC file",
            index: 4,
            input: temp_audio,
            output: dir.join(format!("{base_name}_AUDIO.aac")),
            attempts: vec![&["-c:a", "aac", "-b:a", "192k", "-f", "adts"]],
        },
        ConvertStep {
            description: "Creating MP4 file",
            index: 5,
            input: source.to_path_buf(),
            output: dir.join(format!("{base_name}_VIDEO.mp4")),
            attempts: vec![
                &[
                    "-map", "0:v:0", "-map", "0:a:0?", "-c", "copy", "-movflags", "+faststart",
                ],
                &[
                    "-map", "0:v:0", "-map", "0:a:0?", "-c:v", "libx264", "-preset", "veryfast",
                    "-crf", "20", "-c:a", "aac", "-b:a", "192k", "-movflags", "+faststart",
                ],
            ],
        },
        ConvertStep {
            description: "Creating MKV file",
            index: 6,
            input: source.to_path_buf(),
            output: dir.join(format!("{base_name}_VIDEO.mkv")),
            attempts: vec![&["-map", "0:v:0", "-map", "0:a:0?", "-c", "copy"]],
        },
    ]
}

/// Whole-percent progress after `index` of the nominal stages finished.
pub fn step_percent(index: u32) -> u32 {
    (f64::from(index) / f64::from(TOTAL_STEPS) * 100.0).round() as u32
}

/// Locate the file yt-dlp produced: media files whose name starts with the
/// base name are preferred, largest first; otherwise the largest media file
/// in the folder wins.
pub fn find_downloaded_media(dir: &Path, base_name: &str) -> Result<PathBuf, ConvertError> {
    let mut candidates: Vec<(PathBuf, u64)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !MEDIA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
            continue;
        }
        let size = entry.metadata()?.len();
        candidates.push((path, size));
    }

    if candidates.is_empty() {
        return Err(ConvertError::NoMediaFound(dir.to_path_buf()));
    }

    let prefixed: Vec<(PathBuf, u64)> = candidates
        .iter()
        .filter(|(path, _)| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(base_name))
        })
        .cloned()
        .collect();

    let pool = if prefixed.is_empty() {
        candidates
    } else {
        prefixed
    };
    pool.into_iter()
        .max_by_key(|(_, size)| *size)
        .map(|(path, _)| path)
        .ok_or_else(|| ConvertError::NoMediaFound(dir.to_path_buf()))
}

#[derive(Debug)]
pub struct Converter {
    ffmpeg: PathBuf,
}

impl Converter {
    pub fn new(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }

    /// Run one step's attempts in order, returning on the first success.
    /// A failed attempt keeps its merged output for the error report.
    pub async fn run_step(&self, step: &ConvertStep) -> Result<(), ConvertError> {
        debug!("[{}/{}] {}", step.index, TOTAL_STEPS, step.description);

        let mut transcripts: Vec<String> = Vec::new();
        for argset in step.attempts.iter().copied() {
            let output = Command::new(&self.ffmpeg)
                .arg("-y")
                .arg("-i")
                .arg(&step.input)
                .args(argset)
                .arg(&step.output)
                .kill_on_drop(true)
                .output()
                .await?;

            if output.status.success() {
                let transcript = merged_transcript(&output.stdout, &output.stderr);
                if !transcript.is_empty() {
                    debug!("ffmpeg: {}", transcript);
                }
                if !transcripts.is_empty() {
                    debug!("{} succeeded on fallback arguments", step.description);
                }
                return Ok(());
            }

            warn!(
                "{} attempt {} failed (exit {:?})",
                step.description,
                transcripts.len() + 1,
                output.status.code()
            );
            transcripts.push(tail_lines(
                &merged_transcript(&output.stdout, &output.stderr),
                20,
            ));
        }

        Err(ConvertError::StepFailed {
            step: step.description.to_string(),
            attempts: transcripts.len(),
            transcript: transcripts.join("\n--- next attempt ---\n"),
        })
    }
}

/// Hide the temp audio in Explorer while later steps still read it.
/// Best effort only; a failure is logged and forgotten.
#[cfg(windows)]
pub async fn hide_file(path: &Path) {
    match Command::new("attrib").arg("+h").arg(path).status().await {
        Ok(status) if status.success() => debug!("Hid {}", path.display()),
        Ok(status) => debug!("attrib +h exited with {:?}", status.code()),
        Err(e) => debug!("attrib +h failed: {}", e),
    }
}

#[cfg(not(windows))]
pub async fn hide_file(_path: &Path) {}

fn merged_transcript(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).trim().to_string();
    let err = String::from_utf8_lossy(stderr);
    let err = err.trim();
    if !err.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(err);
    }
    text
}

fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
