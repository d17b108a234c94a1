use crate::config::FeederConfig;

use super::normalize::{FeedRecord, RawFeed};

/// Insert a feed, or merge into the entry resolving to the same feed URL.
/// Blank or missing fields in `rec` keep what the entry already had.
/// Returns true when a new entry was appended.
pub fn upsert_feed(cfg: &mut FeederConfig, rec: FeedRecord) -> bool {
    let url = RawFeed::Structured(rec.clone()).resolved_url();
    match cfg.rss_feeds.iter_mut().find(|f| f.resolved_url() == url) {
        Some(slot) => {
            let merged = merge(as_record(slot), rec);
            *slot = RawFeed::Structured(merged);
            false
        }
        None => {
            cfg.rss_feeds.push(RawFeed::Structured(rec));
            true
        }
    }
}

pub fn contains_feed(cfg: &FeederConfig, feed_url: &str) -> bool {
    let target = feed_url.trim();
    cfg.rss_feeds.iter().any(|f| f.resolved_url() == target)
}

/// Remove every entry resolving to `feed_url`. Returns true when anything was removed.
pub fn remove_feed(cfg: &mut FeederConfig, feed_url: &str) -> bool {
    let target = feed_url.trim();
    let before = cfg.rss_feeds.len();
    cfg.rss_feeds.retain(|f| f.resolved_url() != target);
    cfg.rss_feeds.len() != before
}

fn as_record(raw: &RawFeed) -> FeedRecord {
    match raw {
        RawFeed::Legacy(url) => FeedRecord { url: url.trim().to_string(), ..Default::default() },
        RawFeed::Structured(rec) => rec.clone(),
    }
}

fn merge(mut base: FeedRecord, update: FeedRecord) -> FeedRecord {
    fn keep_or(old: Option<String>, new: Option<String>) -> Option<String> {
        new.filter(|v| !v.trim().is_empty()).or(old)
    }
    if !update.url.trim().is_empty() { base.url = update.url; }
    base.name = keep_or(base.name, update.name);
    base.backlog_playlist_url = keep_or(base.backlog_playlist_url, update.backlog_playlist_url);
    base.channel_id = keep_or(base.channel_id, update.channel_id);
    base.feed_type = keep_or(base.feed_type, update.feed_type);
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(url: &str, name: &str) -> FeedRecord {
        FeedRecord { url: url.into(), name: Some(name.into()), ..Default::default() }
    }

    #[test]
    fn upsert_replaces_legacy_entry() {
        let mut cfg = FeederConfig::default();
        cfg.rss_feeds.push(RawFeed::Legacy("https://e.com/a.xml".into()));
        assert!(!upsert_feed(&mut cfg, rec("https://e.com/a.xml", "A")));
        assert_eq!(cfg.rss_feeds, vec![RawFeed::Structured(rec("https://e.com/a.xml", "A"))]);
        assert!(upsert_feed(&mut cfg, rec("https://e.com/b.xml", "B")));
        assert_eq!(cfg.rss_feeds.len(), 2);
    }

    #[test]
    fn rename_keeps_backlog_and_channel() {
        let mut cfg = FeederConfig::default();
        cfg.rss_feeds.push(RawFeed::Structured(FeedRecord {
            url: "https://e.com/a.xml".into(),
            name: Some("A".into()),
            backlog_playlist_url: Some("https://www.youtube.com/@a/videos".into()),
            channel_id: Some("UCabc".into()),
            ..Default::default()
        }));

        assert!(!upsert_feed(&mut cfg, rec("https://e.com/a.xml", "B")));

        let RawFeed::Structured(stored) = &cfg.rss_feeds[0] else { panic!("expected a record") };
        assert_eq!(stored.name.as_deref(), Some("B"));
        assert_eq!(stored.backlog_playlist_url.as_deref(), Some("https://www.youtube.com/@a/videos"));
        assert_eq!(stored.channel_id.as_deref(), Some("UCabc"));
    }

    #[test]
    fn blank_fields_do_not_clear_existing_ones() {
        let mut cfg = FeederConfig::default();
        cfg.rss_feeds.push(RawFeed::Structured(rec("https://e.com/a.xml", "A")));
        let update = FeedRecord {
            url: "https://e.com/a.xml".into(),
            name: Some("   ".into()),
            backlog_playlist_url: Some("https://e.com/a.xml".into()),
            ..Default::default()
        };

        upsert_feed(&mut cfg, update);

        let RawFeed::Structured(stored) = &cfg.rss_feeds[0] else { panic!("expected a record") };
        assert_eq!(stored.name.as_deref(), Some("A"));
        assert_eq!(stored.backlog_playlist_url.as_deref(), Some("https://e.com/a.xml"));
        assert!(contains_feed(&cfg, " https://e.com/a.xml"));
        assert!(!contains_feed(&cfg, "https://e.com/b.xml"));
    }

    #[test]
    fn remove_matches_resolved_url() {
        let mut cfg = FeederConfig::default();
        cfg.rss_feeds.push(RawFeed::Legacy(" https://e.com/a.xml ".into()));
        cfg.rss_feeds.push(RawFeed::Structured(rec("https://e.com/b.xml", "B")));
        assert!(remove_feed(&mut cfg, "https://e.com/a.xml"));
        assert!(!remove_feed(&mut cfg, "https://e.com/a.xml"));
        assert_eq!(cfg.rss_feeds.len(), 1);
    }
}
