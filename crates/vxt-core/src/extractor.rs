//! Metadata probe and download through the yt-dlp binary

use crate::config::Config;
use crate::error::ExtractError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

/// Default format selection: MP4 container with H.264 video and M4A audio
/// when available, stepping down to whatever the site offers.
pub const DEFAULT_FORMAT: &str =
    "bv*[vcodec^=avc1][ext=mp4]+ba[ext=m4a]/bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/b";

/// Options applied to every yt-dlp invocation.
#[derive(Debug, Clone)]
pub struct ExtractorOpts {
    pub format: String,
    pub cookies_from_browser: Option<String>,
    pub cookies_file: Option<PathBuf>,
    pub user_agent: Option<String>,
}

impl ExtractorOpts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            format: config
                .format
                .clone()
                .unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
            cookies_from_browser: config.cookies_from_browser.clone(),
            cookies_file: config.cookies_file.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// The two fields we need from a probe; everything else yt-dlp reports
/// is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub id: String,
}

/// Events surfaced while a download runs.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Progress {
        percent: f32,
        speed: Option<String>,
        eta: Option<String>,
    },
    Finished,
}

#[derive(Debug)]
pub struct Extractor {
    ytdlp: PathBuf,
    ffmpeg: PathBuf,
    opts: ExtractorOpts,
}

impl Extractor {
    pub fn new(ytdlp: PathBuf, ffmpeg: PathBuf, opts: ExtractorOpts) -> Self {
        Self {
            ytdlp,
            ffmpeg,
            opts,
        }
    }

    /// Query title and id without downloading anything.
    pub async fn probe(&self, url: &str) -> Result<VideoMetadata, ExtractError> {
        debug!("Probing metadata for {}", url);

        let mut cmd = Command::new(&self.ytdlp);
        cmd.args([
            "--dump-single-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
        ]);
        self.apply_access_opts(&mut cmd);
        cmd.arg(url);
        cmd.kill_on_drop(true);

        let output = cmd.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp probe stderr: {}", stderr);
            return Err(ExtractError::Probe {
                url: url.to_string(),
                detail: tail_lines(&stderr, 3),
            });
        }

        let value: Value =
            serde_json::from_slice(&output.stdout).map_err(|e| ExtractError::Probe {
                url: url.to_string(),
                detail: format!("metadata was not valid JSON: {e}"),
            })?;
        metadata_from_value(&value).map_err(|e| ExtractError::Probe {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }

    /// Download into `dir` with `base_name.%(ext)s` as the output template,
    /// reporting progress through `on_event`.
    pub async fn download(
        &self,
        url: &str,
        dir: &Path,
        base_name: &str,
        mut on_event: impl FnMut(DownloadEvent),
    ) -> Result<(), ExtractError> {
        let template = dir.join(format!("{base_name}.%(ext)s"));

        let mut cmd = Command::new(&self.ytdlp);
        cmd.arg("-f").arg(&self.opts.format);
        cmd.arg("-o").arg(&template);
        cmd.arg("--ffmpeg-location").arg(&self.ffmpeg);
        cmd.args([
            "--merge-output-format",
            "mp4",
            "--no-playlist",
            "--no-warnings",
            "--windows-filenames",
            "--newline",
            "--progress",
            "--progress-template",
            "download:%(progress._percent_str)s|%(progress._speed_str)s|%(progress._eta_str)s",
        ]);
        self.apply_access_opts(&mut cmd);
        cmd.arg(url);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        info!("Downloading {} into {}", url, dir.display());
        let mut child = cmd.spawn()?;

        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("yt-dlp stderr: {}", line);
                    buf.push_str(&line);
                    buf.push('\n');
                }
            }
            buf
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(event) = parse_progress_line(&line) {
                    on_event(event);
                } else if !line.trim().is_empty() {
                    debug!("yt-dlp: {}", line);
                }
            }
        }

        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(ExtractError::Download {
                code: status.code(),
                stderr: tail_lines(&stderr_text, 6),
            });
        }

        on_event(DownloadEvent::Finished);
        Ok(())
    }

    fn apply_access_opts(&self, cmd: &mut Command) {
        if let Some(browser) = &self.opts.cookies_from_browser {
            cmd.arg("--cookies-from-browser").arg(browser);
        }
        if let Some(file) = &self.opts.cookies_file {
            cmd.arg("--cookies").arg(file);
        }
        if let Some(agent) = &self.opts.user_agent {
            cmd.arg("--user-agent").arg(agent);
        }
    }
}

fn metadata_from_value(value: &Value) -> Result<VideoMetadata, ExtractError> {
    let obj = value.as_object().ok_or(ExtractError::UnexpectedShape)?;

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            obj.get("fulltitle")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or("video")
        .to_string();

    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("id")
        .to_string();

    Ok(VideoMetadata { title, id })
}

/// Parse one rendered `--progress-template` line, shaped like
/// ` 45.2%| 1.23MiB/s|00:12` (possibly still carrying the `download:`
/// prefix, depending on the yt-dlp version).
fn parse_progress_line(line: &str) -> Option<DownloadEvent> {
    let line = line.trim().strip_prefix("download:").unwrap_or(line).trim();

    let mut parts = line.splitn(3, '|');
    let percent = parts.next()?.trim().strip_suffix('%')?.trim();
    let percent: f32 = percent.parse().ok()?;

    let field = |part: Option<&str>| {
        part.map(str::trim)
            .filter(|s| !s.is_empty() && !s.starts_with("Unknown") && *s != "NA")
            .map(String::from)
    };
    let speed = field(parts.next());
    let eta = field(parts.next());

    Some(DownloadEvent::Progress {
        percent,
        speed,
        eta,
    })
}

fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn progress_line_with_all_fields() {
        assert_eq!(
            parse_progress_line("  45.2%|  1.23MiB/s|00:12"),
            Some(DownloadEvent::Progress {
                percent: 45.2,
                speed: Some("1.23MiB/s".to_string()),
                eta: Some("00:12".to_string()),
            })
        );
    }

    #[test]
    fn progress_line_with_download_prefix() {
        assert_eq!(
            parse_progress_line("download:100.0%|2.0MiB/s|00:00"),
            Some(DownloadEvent::Progress {
                percent: 100.0,
                speed: Some("2.0MiB/s".to_string()),
                eta: Some("00:00".to_string()),
            })
        );
    }

    #[test]
    fn progress_line_hides_unknown_fields() {
        assert_eq!(
            parse_progress_line(" 12.0%|Unknown B/s|NA"),
            Some(DownloadEvent::Progress {
                percent: 12.0,
                speed: None,
                eta: None,
            })
        );
    }

    #[test]
    fn progress_line_rejects_other_output() {
        assert_eq!(parse_progress_line("[Merger] Merging formats"), None);
        assert_eq!(parse_progress_line("[download] Destination: x.mp4"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn metadata_uses_title_and_id() {
        let value = json!({"title": "My Video!", "id": "abc123", "ext": "mp4"});
        let meta = metadata_from_value(&value).unwrap();
        assert_eq!(meta.title, "My Video!");
        assert_eq!(meta.id, "abc123");
    }

    #[test]
    fn metadata_falls_back_to_fulltitle_then_placeholder() {
        let value = json!({"fulltitle": "Full Title", "id": "x"});
        assert_eq!(metadata_from_value(&value).unwrap().title, "Full Title");

        let value = json!({"title": "", "id": ""});
        let meta = metadata_from_value(&value).unwrap();
        assert_eq!(meta.title, "video");
        assert_eq!(meta.id, "id");
    }

    #[test]
    fn metadata_rejects_non_objects() {
        assert!(matches!(
            metadata_from_value(&json!(["not", "an", "object"])),
            Err(ExtractError::UnexpectedShape)
        ));
    }

    #[test]
    fn probe_errors_name_the_url_and_the_cookie_hint() {
        let err = ExtractError::Probe {
            url: "https://example.com/v".to_string(),
            detail: "Metadata response was not a JSON object".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("https://example.com/v"));
        assert!(text.contains("VIDEO_XTRACTOR_COOKIES_FROM_BROWSER"));
        assert!(text.contains("not a JSON object"));
    }

    #[test]
    fn opts_fall_back_to_the_default_format() {
        let opts = ExtractorOpts::from_config(&Config::default());
        assert_eq!(opts.format, DEFAULT_FORMAT);
        assert!(opts.cookies_from_browser.is_none());

        let config = Config {
            format: Some("b".to_string()),
            ..Config::default()
        };
        assert_eq!(ExtractorOpts::from_config(&config).format, "b");
    }

    #[test]
    fn tail_keeps_only_the_last_lines() {
        let text = "one\ntwo\n\nthree\nfour\n";
        assert_eq!(tail_lines(text, 2), "three\nfour");
        assert_eq!(tail_lines("short", 6), "short");
    }
}
