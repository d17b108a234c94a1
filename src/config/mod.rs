use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::feed::normalize::RawFeed;
use crate::util::time::parse_interval;

pub const DEFAULT_CONFIG_PATH: &str = "feeder.json";
pub const DEFAULT_STATE_DIR: &str = ".feeder-state";
pub const DEFAULT_INSTANCE: &str = "default";
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(3600);

/// yt-dlp quality selector forwarded to MeTube.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "best")] Best,
    #[serde(rename = "2160p")] P2160,
    #[serde(rename = "1440p")] P1440,
    #[serde(rename = "1080p")] P1080,
    #[serde(rename = "720p")] P720,
    #[serde(rename = "480p")] P480,
    #[serde(rename = "360p")] P360,
    #[serde(rename = "240p")] P240,
    #[serde(rename = "worst")] Worst,
}

impl Quality {
    pub const ALL: [Quality; 9] = [
        Quality::Best, Quality::P2160, Quality::P1440, Quality::P1080, Quality::P720,
        Quality::P480, Quality::P360, Quality::P240, Quality::Worst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Best => "best",
            Quality::P2160 => "2160p",
            Quality::P1440 => "1440p",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
            Quality::P240 => "240p",
            Quality::Worst => "worst",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Quality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown quality {:?} (expected one of best, 2160p, 1440p, 1080p, 720p, 480p, 360p, 240p, worst)", s))
    }
}

/// On-disk configuration for one feeder instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeederConfig {
    #[serde(default)]
    pub metube_url: String,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub rss_feeds: Vec<RawFeed>,
    #[serde(default = "default_instance")]
    pub instance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_interval: Option<String>,
}

fn default_instance() -> String { DEFAULT_INSTANCE.to_string() }

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            metube_url: String::new(),
            quality: Quality::default(),
            rss_feeds: Vec::new(),
            instance: default_instance(),
            scan_interval: None,
        }
    }
}

impl FeederConfig {
    /// Read the config file (a missing file yields defaults) and apply env overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut cfg = Self::load_file(path)?;
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// File contents only, without env overrides. Used when editing the file.
    pub fn load_file(path: &Path) -> Result<Self> {
        match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing config {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading config {}", path.display())),
        }
    }

    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("METUBE_URL") {
            self.metube_url = url;
        }
        if let Ok(q) = std::env::var("METUBE_QUALITY") {
            self.quality = q.parse()?;
        }
        if let Ok(iv) = std::env::var("FEEDER_SCAN_INTERVAL") {
            self.scan_interval = Some(iv);
        }
        Ok(())
    }

    /// Write atomically (temp file + rename) so a crash never leaves half a config.
    pub fn save(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_vec_pretty(self)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let tmp = tmp_path(path);
        std::fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    /// Normalized MeTube base URL, or None when unset.
    pub fn base_url(&self) -> Option<String> {
        let url = normalize_base_url(&self.metube_url);
        if url.is_empty() { None } else { Some(url) }
    }

    pub fn add_endpoint(&self) -> Option<String> {
        self.base_url().map(|b| format!("{}/add", b))
    }

    pub fn interval(&self) -> Result<Duration> {
        match self.scan_interval.as_deref() {
            None => Ok(DEFAULT_SCAN_INTERVAL),
            Some(s) => parse_interval(s).ok_or_else(|| anyhow::anyhow!("invalid scan_interval {:?} (try 30m, 1h, 90s)", s)),
        }
    }
}

/// Trim, add `http://` when no scheme is given, strip trailing slashes.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() { return String::new(); }
    let with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    };
    with_scheme.trim_end_matches('/').to_string()
}

pub fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("FEEDER_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn resolve_state_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("FEEDER_STATE_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::normalize::FeedRecord;

    #[test]
    fn normalizes_base_url() {
        assert_eq!(normalize_base_url(" localhost:8081/ "), "http://localhost:8081");
        assert_eq!(normalize_base_url("https://tube.lan//"), "https://tube.lan");
        assert_eq!(normalize_base_url("   "), "");
    }

    #[test]
    fn add_endpoint_requires_base_url() {
        let mut cfg = FeederConfig::default();
        assert_eq!(cfg.add_endpoint(), None);
        cfg.metube_url = "http://metube:8081/".into();
        assert_eq!(cfg.add_endpoint().as_deref(), Some("http://metube:8081/add"));
    }

    #[test]
    fn quality_parses_and_serializes() {
        assert_eq!("1080P".parse::<Quality>().unwrap(), Quality::P1080);
        assert!("4k".parse::<Quality>().is_err());
        assert_eq!(serde_json::to_string(&Quality::P720).unwrap(), "\"720p\"");
    }

    #[test]
    fn parses_mixed_feed_list() {
        let raw = r#"{
            "metube_url": "http://metube:8081",
            "quality": "720p",
            "rss_feeds": [
                "https://example.com/legacy.xml",
                {"url": "https://example.com/a.xml", "name": "A", "backlog_playlist_url": "https://example.com/a.xml"}
            ]
        }"#;
        let cfg: FeederConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.quality, Quality::P720);
        assert_eq!(cfg.instance, "default");
        assert_eq!(cfg.rss_feeds.len(), 2);
        assert!(matches!(cfg.rss_feeds[0], RawFeed::Legacy(_)));
        assert!(matches!(cfg.rss_feeds[1], RawFeed::Structured(_)));
    }

    #[test]
    fn interval_defaults_to_one_hour() {
        let mut cfg = FeederConfig::default();
        assert_eq!(cfg.interval().unwrap(), DEFAULT_SCAN_INTERVAL);
        cfg.scan_interval = Some("15m".into());
        assert_eq!(cfg.interval().unwrap(), Duration::from_secs(900));
        cfg.scan_interval = Some("soon".into());
        assert!(cfg.interval().is_err());
    }

    #[test]
    fn save_then_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("feeder.json");
        let mut cfg = FeederConfig::default();
        cfg.metube_url = "http://metube:8081".into();
        cfg.rss_feeds.push(RawFeed::Structured(FeedRecord {
            url: "https://example.com/a.xml".into(),
            name: Some("A".into()),
            ..Default::default()
        }));
        cfg.save(&path).unwrap();
        assert!(!tmp_path(&path).exists());

        let back = FeederConfig::load_file(&path).unwrap();
        assert_eq!(back.metube_url, "http://metube:8081");
        assert_eq!(back.rss_feeds.len(), 1);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = FeederConfig::load_file(&dir.path().join("absent.json")).unwrap();
        assert!(cfg.rss_feeds.is_empty());
        assert_eq!(cfg.base_url(), None);
    }
}
