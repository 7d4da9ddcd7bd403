mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.verbose {
        0 => "vxt=info",
        1 => "vxt=debug",
        2 => "vxt=trace",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    // Handle commands
    match cli.command {
        Some(Commands::Fetch { urls }) => commands::fetch::run(&urls, cli.config.as_deref()).await,
        Some(Commands::Shell) => commands::shell::run(cli.config.as_deref()).await,
        Some(Commands::Doctor) => commands::doctor::run(cli.config.as_deref()).await,
        Some(Commands::Config) => commands::config::run(cli.config.as_deref()).await,
        None => {
            // A URL given directly is treated as a fetch
            if let Some(url) = cli.url {
                commands::fetch::run(&[url], cli.config.as_deref()).await
            } else {
                commands::shell::run(cli.config.as_deref()).await
            }
        }
    }
}
