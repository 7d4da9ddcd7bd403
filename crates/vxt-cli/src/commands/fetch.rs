use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;

use vxt_core::{Config, Pipeline, PipelineStage};

pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: Vec<(String, String)>,
    pub interrupted: bool,
}

pub async fn run(urls: &[String], config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let summary = process_batch(&config, urls).await;

    if urls.len() == 1 && !summary.interrupted {
        if let Some((_, error)) = summary.failed.first() {
            anyhow::bail!("{error}");
        }
        return Ok(());
    }

    print_summary(&summary);
    Ok(())
}

/// Process URLs strictly in order. A failed URL is reported and the batch
/// moves on; Ctrl-C stops the remaining queue.
pub async fn process_batch(config: &Config, urls: &[String]) -> BatchSummary {
    let total = urls.len();
    debug!("Processing {} URL(s)", total);

    let mut summary = BatchSummary {
        succeeded: 0,
        failed: Vec::new(),
        interrupted: false,
    };

    for (idx, url) in urls.iter().enumerate() {
        if total > 1 {
            println!("\n[{}/{}] {}", idx + 1, total, truncate(url, 60));
        }

        let (tx, rx) = mpsc::channel(32);
        let pipeline = match Pipeline::prepare(config, tx) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                eprintln!("Error: {}", e);
                summary.failed.push((url.clone(), e.to_string()));
                continue;
            }
        };

        let progress_handle = tokio::spawn(render_progress(rx));

        // Dropping the in-flight future kills the spawned child processes.
        let result = tokio::select! {
            result = pipeline.run(url) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        drop(pipeline);
        let _ = progress_handle.await;

        match result {
            Some(Ok(_)) => summary.succeeded += 1,
            Some(Err(e)) => {
                eprintln!("Error: {}", e);
                summary.failed.push((url.clone(), e.to_string()));
            }
            None => {
                eprintln!("\nInterrupted, skipping the remaining URLs");
                summary.interrupted = true;
                break;
            }
        }
    }

    summary
}

pub fn print_summary(summary: &BatchSummary) {
    println!("\n=== Batch Complete ===");
    println!("Succeeded: {}", summary.succeeded);
    println!("Failed: {}", summary.failed.len());

    if !summary.failed.is_empty() {
        println!("\nFailed URLs:");
        for (url, error) in &summary.failed {
            println!("  {} - {}", url, error);
        }
    }
}

async fn render_progress(mut rx: mpsc::Receiver<PipelineStage>) {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {msg}",
        )
        .unwrap()
        .progress_chars("=>-"),
    );

    while let Some(stage) = rx.recv().await {
        match stage {
            PipelineStage::Probing => {
                pb.set_message("Fetching metadata...");
            }
            PipelineStage::Downloading {
                percent,
                speed,
                eta,
            } => {
                // The download spans the first of the seven nominal stages
                pb.set_position((f64::from(percent) / 100.0 * 14.0) as u64);
                let mut msg = format!("Downloading {:.1}%", percent);
                if let Some(speed) = speed {
                    msg.push_str(&format!(" at {}", speed));
                }
                if let Some(eta) = eta {
                    msg.push_str(&format!(", ETA {}", eta));
                }
                pb.set_message(msg);
            }
            PipelineStage::Converting {
                step,
                total,
                percent,
                description,
            } => {
                pb.set_position(u64::from(percent));
                pb.set_message(format!("[{}/{}] {}", step, total, description));
            }
            PipelineStage::Complete { folder, duration } => {
                pb.set_position(100);
                pb.finish_with_message(format!(
                    "Done: {} ({:.1}s)",
                    folder.display(),
                    duration.as_secs_f32()
                ));
            }
            PipelineStage::Failed { stage, error } => {
                pb.abandon_with_message(format!("Failed at {}: {}", stage, error));
            }
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{cut}...")
    }
}
