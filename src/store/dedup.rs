use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use super::{FeedStat, PersistedDocument};

/// In-memory view of the persisted document for the duration of one cycle.
#[derive(Clone, Debug, Default)]
pub struct DedupStore {
    seen: HashSet<String>,
    backlog_done: HashSet<String>,
    feed_stats: BTreeMap<String, FeedStat>,
}

impl DedupStore {
    pub fn from_document(doc: PersistedDocument) -> Self {
        Self {
            seen: doc.urls.into_iter().collect(),
            backlog_done: doc.backlog_done.into_iter().collect(),
            feed_stats: doc.feed_stats,
        }
    }

    /// Sorted lists, so identical state always serializes identically.
    pub fn to_document(&self) -> PersistedDocument {
        let mut urls: Vec<String> = self.seen.iter().cloned().collect();
        urls.sort();
        let mut backlog_done: Vec<String> = self.backlog_done.iter().cloned().collect();
        backlog_done.sort();
        PersistedDocument { urls, backlog_done, feed_stats: self.feed_stats.clone() }
    }

    pub fn is_seen(&self, url: &str) -> bool { self.seen.contains(url) }

    /// Returns true when the URL was not seen before.
    pub fn mark_seen(&mut self, url: &str) -> bool { self.seen.insert(url.to_string()) }

    pub fn is_backlog_done(&self, feed_url: &str) -> bool { self.backlog_done.contains(feed_url) }

    pub fn mark_backlog_done(&mut self, feed_url: &str) { self.backlog_done.insert(feed_url.to_string()); }

    pub fn record(&mut self, feed_url: &str, sent: u64) { self.record_at(feed_url, sent, Utc::now()) }

    pub fn record_at(&mut self, feed_url: &str, sent: u64, now: DateTime<Utc>) {
        let stat = self
            .feed_stats
            .entry(feed_url.to_string())
            .or_insert(FeedStat { last_fetched: now, total_sent: 0 });
        stat.last_fetched = now;
        stat.total_sent = stat.total_sent.saturating_add(sent);
    }

    pub fn stats(&self) -> &BTreeMap<String, FeedStat> { &self.feed_stats }

    pub fn seen_len(&self) -> usize { self.seen.len() }

    /// Feed URLs carrying stats or a backlog marker, sorted.
    pub fn tracked_feeds(&self) -> Vec<String> {
        let mut out: Vec<String> = self.feed_stats.keys().cloned().collect();
        out.extend(self.backlog_done.iter().filter(|u| !self.feed_stats.contains_key(*u)).cloned());
        out.sort();
        out
    }

    pub fn forget_feeds(&mut self, feed_urls: &[String]) {
        for url in feed_urls {
            self.feed_stats.remove(url);
            self.backlog_done.remove(url);
        }
    }

    pub fn clear_seen(&mut self) { self.seen.clear(); }
}
