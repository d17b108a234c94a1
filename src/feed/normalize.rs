use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use super::youtube::{self, FeedType};

/// One `rss_feeds` element as written in the config: a bare URL (older configs)
/// or a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFeed {
    Legacy(String),
    Structured(FeedRecord),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backlog_playlist_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_type: Option<String>,
}

/// A configured feed after normalization. `feed_url` keys stats and backlog markers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeedDescriptor {
    pub feed_url: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlog_source: Option<String>,
}

impl FeedDescriptor {
    pub fn wants_backlog(&self) -> bool { self.backlog_source.is_some() }
}

impl RawFeed {
    /// Feed URL this entry resolves to, deriving it from a channel id when needed.
    pub fn resolved_url(&self) -> String {
        match self {
            RawFeed::Legacy(url) => url.trim().to_string(),
            RawFeed::Structured(rec) => {
                let url = rec.url.trim();
                if !url.is_empty() { return url.to_string(); }
                match rec.channel_id.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                    Some(cid) => youtube::channel_feed_url(cid, FeedType::parse_lenient(rec.feed_type.as_deref())),
                    None => String::new(),
                }
            }
        }
    }

    fn to_descriptor(&self) -> Option<FeedDescriptor> {
        let feed_url = self.resolved_url();
        if feed_url.is_empty() { return None; }
        let (name, backlog) = match self {
            RawFeed::Legacy(_) => (None, None),
            RawFeed::Structured(rec) => (rec.name.as_deref(), rec.backlog_playlist_url.as_deref()),
        };
        let display_name = non_blank(name).unwrap_or_else(|| feed_url.clone());
        Some(FeedDescriptor { backlog_source: non_blank(backlog), display_name, feed_url })
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn is_absolute_http(url: &str) -> bool {
    match Url::parse(url) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some(),
        Err(_) => false,
    }
}

/// Normalize raw feed entries in config order. Blank entries are dropped silently,
/// malformed URLs with a warning, and repeated feed URLs keep their first occurrence.
pub fn normalize(raw: &[RawFeed]) -> Vec<FeedDescriptor> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for entry in raw {
        let Some(desc) = entry.to_descriptor() else { continue };
        if !is_absolute_http(&desc.feed_url) {
            warn!(feed_url = %desc.feed_url, "skipping feed with invalid url");
            continue;
        }
        if !seen.insert(desc.feed_url.clone()) { continue; }
        out.push(desc);
    }
    out
}

/// Parse the one-line form `Name | RSS URL | Backlog URL`, `Name | RSS URL` or a bare URL.
pub fn parse_line(line: &str) -> Option<FeedRecord> {
    let line = line.trim();
    if line.is_empty() { return None; }
    let parts: Vec<&str> = line.split(" | ").map(str::trim).collect();
    let (first, second, backlog) = match parts.len() {
        1 => (parts[0], "", String::new()),
        2 => (parts[0], parts[1], String::new()),
        _ => (parts[0], parts[1], parts[2..].join(" | ").trim().to_string()),
    };
    let is_url = |s: &str| s.starts_with("http://") || s.starts_with("https://");
    let (name, url) = if is_url(second) {
        (first, second)
    } else if is_url(first) {
        ("", first)
    } else {
        return None;
    };
    Some(FeedRecord {
        url: url.to_string(),
        name: non_blank(Some(name)),
        backlog_playlist_url: non_blank(Some(&backlog)),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(url: &str, name: Option<&str>, backlog: Option<&str>) -> RawFeed {
        RawFeed::Structured(FeedRecord {
            url: url.into(),
            name: name.map(Into::into),
            backlog_playlist_url: backlog.map(Into::into),
            ..Default::default()
        })
    }

    #[test]
    fn legacy_string_uses_url_as_name() {
        let out = normalize(&[RawFeed::Legacy(" https://example.com/feed.xml ".into())]);
        assert_eq!(out, vec![FeedDescriptor {
            feed_url: "https://example.com/feed.xml".into(),
            display_name: "https://example.com/feed.xml".into(),
            backlog_source: None,
        }]);
    }

    #[test]
    fn structured_keeps_name_and_backlog() {
        let out = normalize(&[rec("https://example.com/a.xml", Some(" Chan A "), Some("https://www.youtube.com/@a/videos"))]);
        assert_eq!(out[0].display_name, "Chan A");
        assert_eq!(out[0].backlog_source.as_deref(), Some("https://www.youtube.com/@a/videos"));
        assert!(out[0].wants_backlog());
    }

    #[test]
    fn blank_entries_dropped_and_order_preserved() {
        let out = normalize(&[
            RawFeed::Legacy("   ".into()),
            rec("https://example.com/b.xml", None, Some("  ")),
            rec("", Some("nameless"), None),
            RawFeed::Legacy("https://example.com/a.xml".into()),
        ]);
        let urls: Vec<&str> = out.iter().map(|d| d.feed_url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/b.xml", "https://example.com/a.xml"]);
        assert_eq!(out[0].backlog_source, None);
        assert_eq!(out[0].display_name, "https://example.com/b.xml");
    }

    #[test]
    fn invalid_and_duplicate_urls_dropped() {
        let out = normalize(&[
            RawFeed::Legacy("not a url".into()),
            RawFeed::Legacy("ftp://example.com/feed".into()),
            rec("https://example.com/a.xml", Some("first"), None),
            rec("https://example.com/a.xml", Some("second"), None),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].display_name, "first");
    }

    #[test]
    fn channel_id_derives_feed_url() {
        let raw = RawFeed::Structured(FeedRecord {
            channel_id: Some("UCabcdef".into()),
            feed_type: Some("Shorts".into()),
            ..Default::default()
        });
        let out = normalize(&[raw]);
        assert_eq!(out[0].feed_url, "https://www.youtube.com/feeds/videos.xml?playlist_id=UUSHabcdef");
    }

    #[test]
    fn untagged_deserialize() {
        let raw: Vec<RawFeed> = serde_json::from_str(r#"["https://e.com/x.xml", {"url": "https://e.com/y.xml", "name": "Y"}]"#).unwrap();
        assert_eq!(raw[0], RawFeed::Legacy("https://e.com/x.xml".into()));
        assert_eq!(raw[1], rec("https://e.com/y.xml", Some("Y"), None));
    }

    #[test]
    fn parse_line_forms() {
        let r = parse_line("My Channel | https://e.com/f.xml | https://www.youtube.com/@me/videos").unwrap();
        assert_eq!(r.name.as_deref(), Some("My Channel"));
        assert_eq!(r.url, "https://e.com/f.xml");
        assert_eq!(r.backlog_playlist_url.as_deref(), Some("https://www.youtube.com/@me/videos"));

        let r = parse_line("https://e.com/f.xml").unwrap();
        assert_eq!(r.name, None);
        assert_eq!(r.url, "https://e.com/f.xml");

        let r = parse_line("Named | https://e.com/f.xml").unwrap();
        assert_eq!(r.name.as_deref(), Some("Named"));
        assert_eq!(r.backlog_playlist_url, None);

        assert!(parse_line("@somehandle | videos").is_none());
        assert!(parse_line("  ").is_none());
    }
}
