use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::warn;

const DEFAULT_PROGRAM: &str = "yt-dlp";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Flat enumeration of a channel or playlist. Best-effort: failures yield an empty list.
#[async_trait]
pub trait CatalogLister: Send + Sync {
    async fn list_video_urls(&self, source: &str) -> Vec<String>;
}

#[derive(Clone, Debug)]
pub struct YtDlpCatalog {
    program: String,
    timeout: Duration,
}

impl YtDlpCatalog {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self { program: program.into(), timeout }
    }

    /// `YTDLP_PATH` overrides the binary looked up on PATH.
    pub fn from_env() -> Self {
        let program = std::env::var("YTDLP_PATH").unwrap_or_else(|_| DEFAULT_PROGRAM.to_string());
        Self::new(program, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl CatalogLister for YtDlpCatalog {
    async fn list_video_urls(&self, source: &str) -> Vec<String> {
        let mut command = Command::new(&self.program);
        command
            .arg("--flat-playlist")
            .arg("--get-id")
            .arg("--ignore-errors")
            .arg(source)
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                warn!(source, timeout_secs = self.timeout.as_secs(), "catalog listing timed out");
                return Vec::new();
            }
            Ok(Err(e)) => {
                warn!(source, program = %self.program, error = %e, "catalog listing failed to start");
                return Vec::new();
            }
            Ok(Ok(out)) => out,
        };

        let urls = ids_to_urls(&String::from_utf8_lossy(&output.stdout));
        // --ignore-errors exits non-zero when single entries fail; keep what was listed
        if !output.status.success() {
            warn!(source, status = %output.status, listed = urls.len(), "catalog listing exited with errors");
        }
        urls
    }
}

/// One id (or full URL) per line → canonical watch URLs, order kept, duplicates dropped.
pub fn ids_to_urls(stdout: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with("http://") || line.starts_with("https://") {
                line.to_string()
            } else {
                format!("{}{}", WATCH_URL, line)
            }
        })
        .filter(|url| seen.insert(url.clone()))
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_become_watch_urls() {
        let out = ids_to_urls("abc\n\n  def  \nabc\nhttps://www.youtube.com/watch?v=xyz\n");
        assert_eq!(out, vec![
            "https://www.youtube.com/watch?v=abc",
            "https://www.youtube.com/watch?v=def",
            "https://www.youtube.com/watch?v=xyz",
        ]);
    }

    #[tokio::test]
    async fn missing_binary_yields_empty_list() {
        let cat = YtDlpCatalog::new("/nonexistent/yt-dlp-for-tests", Duration::from_secs(5));
        assert!(cat.list_video_urls("https://www.youtube.com/@nobody/videos").await.is_empty());
    }
}
