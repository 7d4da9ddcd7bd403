//! Per-URL orchestration of the download and conversion stages

use crate::config::Config;
use crate::convert::{self, Converter, TOTAL_STEPS};
use crate::error::Result;
use crate::extractor::{DownloadEvent, Extractor, ExtractorOpts};
use crate::output;
use crate::sanitize::{sanitize_filename, MAX_ID_LEN, MAX_TITLE_LEN};
use crate::tools;

use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Progress events emitted while a URL moves through the pipeline.
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Probing,
    Downloading {
        percent: f32,
        speed: Option<String>,
        eta: Option<String>,
    },
    Converting {
        step: u32,
        total: u32,
        percent: u32,
        description: &'static str,
    },
    Complete {
        folder: PathBuf,
        duration: Duration,
    },
    Failed {
        stage: String,
        error: String,
    },
}

/// Everything produced for one URL.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub title: String,
    pub folder: PathBuf,
}

pub struct Pipeline {
    extractor: Extractor,
    converter: Converter,
    output_root: PathBuf,
    progress_tx: mpsc::Sender<PipelineStage>,
}

impl Pipeline {
    /// Resolve tools and the output root once, up front. Both tool lookups
    /// fail fast so a missing ffmpeg is reported before any download starts.
    pub fn prepare(config: &Config, progress_tx: mpsc::Sender<PipelineStage>) -> Result<Self> {
        let ffmpeg = tools::find_ffmpeg(config)?;
        let ytdlp = tools::find_ytdlp(config)?;
        let output_root = output::resolve_output_root(config)?;

        debug!("Using yt-dlp at {}", ytdlp.display());
        debug!("Using ffmpeg at {}", ffmpeg.display());
        debug!("Output root: {}", output_root.display());

        let extractor = Extractor::new(ytdlp, ffmpeg.clone(), ExtractorOpts::from_config(config));
        let converter = Converter::new(ffmpeg);

        Ok(Self {
            extractor,
            converter,
            output_root,
            progress_tx,
        })
    }

    /// Run the full pipeline for one URL: probe the metadata for a folder
    /// name, then download and cut the five derivatives inside a fresh
    /// folder.
    pub async fn run(&self, url: &str) -> Result<PipelineOutcome> {
        let start = Instant::now();

        let _ = self.progress_tx.send(PipelineStage::Probing).await;
        let meta = self.extractor.probe(url).await.map_err(|e| {
            let _ = self.progress_tx.try_send(PipelineStage::Failed {
                stage: "probe".to_string(),
                error: e.to_string(),
            });
            e
        })?;

        let safe_title = sanitize_filename(&meta.title, MAX_TITLE_LEN);
        let safe_id = sanitize_filename(&meta.id, MAX_ID_LEN);
        let folder_name = format!("{safe_title}__{safe_id}");

        let dir = output::create_unique_dir(&self.output_root, &folder_name).map_err(|e| {
            let _ = self.progress_tx.try_send(PipelineStage::Failed {
                stage: "output".to_string(),
                error: e.to_string(),
            });
            e
        })?;
        info!("Downloading \"{}\" into {}", meta.title, dir.display());

        // A folder may pick up a _2 suffix, but the files inside always
        // use the unsuffixed base name.
        let base_name = folder_name.as_str();

        let _ = self
            .progress_tx
            .send(PipelineStage::Downloading {
                percent: 0.0,
                speed: None,
                eta: None,
            })
            .await;

        let tx = self.progress_tx.clone();
        self.extractor
            .download(url, &dir, base_name, move |event| {
                let stage = match event {
                    DownloadEvent::Progress {
                        percent,
                        speed,
                        eta,
                    } => PipelineStage::Downloading {
                        percent,
                        speed,
                        eta,
                    },
                    DownloadEvent::Finished => PipelineStage::Downloading {
                        percent: 100.0,
                        speed: None,
                        eta: None,
                    },
                };
                let _ = tx.try_send(stage);
            })
            .await
            .map_err(|e| {
                let _ = self.progress_tx.try_send(PipelineStage::Failed {
                    stage: "download".to_string(),
                    error: e.to_string(),
                });
                e
            })?;

        let source = convert::find_downloaded_media(&dir, base_name).map_err(|e| {
            let _ = self.progress_tx.try_send(PipelineStage::Failed {
                stage: "convert".to_string(),
                error: e.to_string(),
            });
            e
        })?;
        debug!("Converting from {}", source.display());

        let steps = convert::plan_steps(&dir, base_name, &source);
        let temp_audio = convert::temp_audio_path(&dir, base_name);
        for step in &steps {
            self.converter.run_step(step).await.map_err(|e| {
                let _ = self.progress_tx.try_send(PipelineStage::Failed {
                    stage: "convert".to_string(),
                    error: e.to_string(),
                });
                e
            })?;
            if step.index == 1 {
                convert::hide_file(&temp_audio).await;
            }
            let _ = self
                .progress_tx
                .send(PipelineStage::Converting {
                    step: step.index,
                    total: TOTAL_STEPS,
                    percent: convert::step_percent(step.index),
                    description: step.description,
                })
                .await;
        }

        if let Err(e) = tokio::fs::remove_file(&temp_audio).await {
            debug!("Could not remove {}: {}", temp_audio.display(), e);
        }

        let duration = start.elapsed();
        info!(
            "Finished \"{}\" in {:.1}s ({}/{} - 100%)",
            meta.title,
            duration.as_secs_f64(),
            TOTAL_STEPS,
            TOTAL_STEPS
        );
        let _ = self
            .progress_tx
            .send(PipelineStage::Complete {
                folder: dir.clone(),
                duration,
            })
            .await;

        Ok(PipelineOutcome {
            title: meta.title,
            folder: dir,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn write_stub(dir: &Path, name: &str, script: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// yt-dlp stand-in: answers the metadata probe with fixed JSON, and on
    /// download materializes the file named by the -o template.
    fn fake_ytdlp(dir: &Path) -> PathBuf {
        write_stub(
            dir,
            "yt-dlp",
            r#"#!/bin/sh
case "$*" in
  *--dump-single-json*)
    echo '{"title": "My Video!", "id": "abc123"}'
    ;;
  *)
    out=""
    prev=""
    for arg in "$@"; do
      if [ "$prev" = "-o" ]; then out="$arg"; fi
      prev="$arg"
    done
    target=$(printf '%s' "$out" | sed 's/%(ext)s/mp4/')
    printf 'media-bytes-media-bytes' > "$target"
    echo 'download: 100.0%| 1.00MiB/s|00:00'
    ;;
esac
"#,
        )
    }

    /// ffmpeg stand-in: writes a marker into whatever the last argument is.
    fn fake_ffmpeg(dir: &Path) -> PathBuf {
        write_stub(
            dir,
            "ffmpeg",
            r#"#!/bin/sh
for last; do :; done
echo converted > "$last"
"#,
        )
    }

    fn test_config(tools_dir: &Path, out_dir: &Path) -> Config {
        Config {
            output_dir: Some(out_dir.to_path_buf()),
            ffmpeg: Some(fake_ffmpeg(tools_dir)),
            ytdlp: Some(fake_ytdlp(tools_dir)),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn full_run_produces_all_derivatives() {
        let tools_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let config = test_config(tools_dir.path(), out_dir.path());

        let (tx, mut rx) = mpsc::channel(64);
        let pipeline = Pipeline::prepare(&config, tx).unwrap();
        let outcome = pipeline
            .run("https://www.youtube.com/watch?v=abc123")
            .await
            .unwrap();

        assert_eq!(outcome.title, "My Video!");
        let folder = outcome.folder;
        assert_eq!(folder.file_name().unwrap(), "My_Video__abc123");

        for name in [
            "My_Video__abc123.mp4",
            "My_Video__abc123_AUDIO.mp3",
            "My_Video__abc123_AUDIO.flac",
            "My_Video__abc123_AUDIO.aac",
            "My_Video__abc123_VIDEO.mp4",
            "My_Video__abc123_VIDEO.mkv",
        ] {
            assert!(folder.join(name).is_file(), "missing {name}");
        }
        assert!(!folder.join("My_Video__abc123_TEMP_AUDIO.m4a").exists());

        drop(pipeline);
        let mut saw_complete = false;
        while let Some(stage) = rx.recv().await {
            if matches!(stage, PipelineStage::Complete { .. }) {
                saw_complete = true;
            }
            assert!(!matches!(stage, PipelineStage::Failed { .. }));
        }
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn rerunning_the_same_url_gets_a_suffixed_folder() {
        let tools_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let config = test_config(tools_dir.path(), out_dir.path());

        let (tx, _rx) = mpsc::channel(64);
        let pipeline = Pipeline::prepare(&config, tx).unwrap();
        let first = pipeline.run("https://youtu.be/abc123").await.unwrap();
        let second = pipeline.run("https://youtu.be/abc123").await.unwrap();

        assert_eq!(first.folder.file_name().unwrap(), "My_Video__abc123");
        assert_eq!(second.folder.file_name().unwrap(), "My_Video__abc123_2");
        assert!(second.folder.join("My_Video__abc123_VIDEO.mkv").is_file());
    }

    #[tokio::test]
    async fn non_object_metadata_reports_the_cookie_hint() {
        let tools_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let mut config = test_config(tools_dir.path(), out_dir.path());
        config.ytdlp = Some(write_stub(
            tools_dir.path(),
            "yt-dlp-array",
            "#!/bin/sh\necho '[\"not\", \"an\", \"object\"]'\n",
        ));

        let (tx, _rx) = mpsc::channel(64);
        let pipeline = Pipeline::prepare(&config, tx).unwrap();
        let err = pipeline.run("https://example.com/clip").await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("https://example.com/clip"));
        assert!(message.contains("VIDEO_XTRACTOR_COOKIES_FROM_BROWSER"));
    }

    #[tokio::test]
    async fn probe_failure_reports_the_stage() {
        let tools_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let mut config = test_config(tools_dir.path(), out_dir.path());
        config.ytdlp = Some(write_stub(
            tools_dir.path(),
            "yt-dlp-broken",
            "#!/bin/sh\necho 'ERROR: unsupported url' >&2\nexit 1\n",
        ));

        let (tx, mut rx) = mpsc::channel(64);
        let pipeline = Pipeline::prepare(&config, tx).unwrap();
        let err = pipeline.run("https://example.com/clip").await.unwrap_err();
        assert!(err.to_string().contains("unsupported url"));

        drop(pipeline);
        let mut saw_failed = false;
        while let Some(stage) = rx.recv().await {
            if let PipelineStage::Failed { stage, .. } = stage {
                assert_eq!(stage, "probe");
                saw_failed = true;
            }
        }
        assert!(saw_failed);
    }
}
