use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;

use super::fetch;
use vxt_core::Config;

/// Platforms the prompt recognizes without a warning. Anything else that
/// still looks like an http(s) URL is handed to yt-dlp regardless.
const KNOWN_SITES: [&str; 6] = [
    "https://www.youtube.com",
    "https://youtu.be",
    "https://www.tiktok.com",
    "https://www.instagram.com",
    "https://www.twitch.tv",
    "https://www.dailymotion.com",
];

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    let urls = prompt_for_urls()?;
    if urls.is_empty() {
        println!("Nothing to do.");
        hold_open().await;
        return Ok(());
    }

    let summary = fetch::process_batch(&config, &urls).await;
    if urls.len() > 1 || summary.interrupted {
        fetch::print_summary(&summary);
    }

    hold_open().await;
    Ok(())
}

/// Keep asking until at least one URL survives screening. An empty line
/// (or closed stdin) cancels.
fn prompt_for_urls() -> io::Result<Vec<String>> {
    loop {
        print!("Paste one or more video URLs (separated by spaces or commas): ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(Vec::new());
        }
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }

        let urls = screen_urls(&split_tokens(line));
        if !urls.is_empty() {
            return Ok(urls);
        }
        println!("No usable URLs, try again or press Enter to quit.");
    }
}

fn split_tokens(line: &str) -> Vec<&str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}

/// Keep http(s) URLs in their given order, duplicates included. Unknown
/// platforms get a note but are not rejected.
fn screen_urls(tokens: &[&str]) -> Vec<String> {
    let mut urls = Vec::new();
    for token in tokens {
        let lower = token.to_ascii_lowercase();
        if !lower.starts_with("http://") && !lower.starts_with("https://") {
            println!("Ignoring {} (not an http/https URL)", token);
            continue;
        }
        if !KNOWN_SITES.iter().any(|site| lower.starts_with(site)) {
            println!("Note: {} is not a recognized platform, trying it anyway", token);
        }
        urls.push((*token).to_string());
    }
    urls
}

/// A double-click launch closes its window with the process; the final
/// read keeps the output visible until Enter or Ctrl-C. The signal handler
/// installed for the batch loop outlives it, so a plain blocking read
/// would no longer die on SIGINT.
async fn hold_open() {
    print!("\nPress Enter to exit...");
    let _ = io::stdout().flush();

    let read = tokio::task::spawn_blocking(|| {
        let _ = io::stdin().read_line(&mut String::new());
    });
    tokio::select! {
        _ = read => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_split_on_commas_and_whitespace() {
        assert_eq!(split_tokens("a, b c"), vec!["a", "b", "c"]);
        assert_eq!(split_tokens("one,,two,  three"), vec!["one", "two", "three"]);
        assert_eq!(split_tokens("  lone  "), vec!["lone"]);
        assert!(split_tokens("").is_empty());
        assert!(split_tokens(" , ,, ").is_empty());
    }

    #[test]
    fn screening_drops_non_http_schemes() {
        let urls = screen_urls(&["ftp://example.com/file", "not-a-url"]);
        assert!(urls.is_empty());
    }

    #[test]
    fn screening_accepts_known_platforms() {
        let urls = screen_urls(&[
            "https://www.youtube.com/watch?v=abc",
            "https://youtu.be/abc",
            "https://www.twitch.tv/videos/123",
        ]);
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn screening_is_case_insensitive_on_the_scheme() {
        let urls = screen_urls(&["HTTPS://YOUTU.BE/abc"]);
        assert_eq!(urls, vec!["HTTPS://YOUTU.BE/abc"]);
    }

    #[test]
    fn screening_keeps_unknown_sites() {
        let urls = screen_urls(&["https://example.com/talk.mp4"]);
        assert_eq!(urls, vec!["https://example.com/talk.mp4"]);
    }

    #[test]
    fn screening_preserves_order_and_duplicates() {
        let urls = screen_urls(&[
            "https://youtu.be/one",
            "ftp://skipped",
            "https://youtu.be/two",
            "https://youtu.be/one",
        ]);
        assert_eq!(
            urls,
            vec![
                "https://youtu.be/one",
                "https://youtu.be/two",
                "https://youtu.be/one",
            ]
        );
    }
}
