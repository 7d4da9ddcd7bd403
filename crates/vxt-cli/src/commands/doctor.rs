use anyhow::Result;
use std::path::Path;
use std::process::Command;

use vxt_core::{config::Config, output, tools};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("vxt dependency check\n");

    let mut all_ok = true;

    // Check yt-dlp, honoring a configured override
    print!("yt-dlp:   ");
    match tools::find_ytdlp(&config) {
        Ok(path) => {
            let version = Command::new(&path).arg("--version").output();
            match version {
                Ok(out) => {
                    let v = String::from_utf8_lossy(&out.stdout);
                    println!("OK ({}, {})", v.trim(), path.display());
                }
                Err(_) => {
                    println!("FOUND but failed to get version");
                    all_ok = false;
                }
            }
        }
        Err(_) => {
            println!("NOT FOUND");
            println!("          Install with: pip install yt-dlp");
            all_ok = false;
        }
    }

    // Check ffmpeg
    print!("ffmpeg:   ");
    match tools::find_ffmpeg(&config) {
        Ok(path) => {
            let version = Command::new(&path).args(["-version"]).output();
            match version {
                Ok(out) => {
                    let first_line = String::from_utf8_lossy(&out.stdout)
                        .lines()
                        .next()
                        .unwrap_or("")
                        .to_string();
                    // Extract just version number
                    let version_part = first_line
                        .split_whitespace()
                        .nth(2)
                        .unwrap_or("unknown");
                    println!("OK ({}, {})", version_part, path.display());
                }
                Err(_) => {
                    println!("FOUND but failed to get version");
                    all_ok = false;
                }
            }
        }
        Err(_) => {
            println!("NOT FOUND");
            println!("          Install ffmpeg or set VIDEO_XTRACTOR_FFMPEG");
            all_ok = false;
        }
    }

    // Check that the output root is usable
    print!("output:   ");
    match output::resolve_output_root(&config) {
        Ok(root) => println!("OK ({})", root.display()),
        Err(e) => {
            println!("UNAVAILABLE ({})", e);
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for installation instructions.");
    }

    Ok(())
}
