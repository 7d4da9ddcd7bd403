use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vxt")]
#[command(author, version, about = "Download videos and derive audio/video variants")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Video URL to process (shorthand for `fetch <URL>`)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download URLs and derive every output variant
    Fetch {
        /// Video URLs
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },

    /// Prompt for URLs, process them, wait for Enter before exiting
    Shell,

    /// Check that yt-dlp and ffmpeg are available
    Doctor,

    /// Show configuration
    Config,
}
