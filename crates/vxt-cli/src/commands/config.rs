use anyhow::Result;
use std::path::Path;
use vxt_core::config::Config;
use vxt_core::extractor::DEFAULT_FORMAT;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("vxt configuration\n");

    if let Some(ref p) = config.output_dir {
        println!("output_dir = {:?}", p);
    } else {
        println!("output_dir = (auto-detect)");
    }
    if let Some(ref p) = config.ffmpeg {
        println!("ffmpeg = {:?}", p);
    } else {
        println!("ffmpeg = (auto-detect)");
    }
    if let Some(ref p) = config.ytdlp {
        println!("ytdlp = {:?}", p);
    } else {
        println!("ytdlp = (auto-detect)");
    }
    if let Some(ref f) = config.format {
        println!("format = {:?}", f);
    } else {
        println!("format = {:?} (default)", DEFAULT_FORMAT);
    }
    if let Some(ref b) = config.cookies_from_browser {
        println!("cookies_from_browser = {:?}", b);
    } else {
        println!("cookies_from_browser = (none)");
    }
    if let Some(ref p) = config.cookies_file {
        println!("cookies_file = {:?}", p);
    } else {
        println!("cookies_file = (none)");
    }
    if let Some(ref ua) = config.user_agent {
        println!("user_agent = {:?}", ua);
    } else {
        println!("user_agent = (none)");
    }

    // Show config file locations
    println!("\nConfig file locations (in priority order):");
    if let Some(p) = config_path {
        println!("  1. {} (specified)", p.display());
    }
    if let Some(config_dir) = dirs::config_dir() {
        println!("  2. {}/video-xtractor/config.toml", config_dir.display());
    }
    println!("  3. Environment variables (VIDEO_XTRACTOR_*)");

    Ok(())
}
