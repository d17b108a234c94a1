use std::collections::HashSet;

use crate::feed::normalize::FeedDescriptor;
use crate::store::DedupStore;

/// Feed URLs with stored stats or backlog markers that are no longer configured.
pub fn vanished_feeds(dedup: &DedupStore, feeds: &[FeedDescriptor]) -> Vec<String> {
    let current: HashSet<&str> = feeds.iter().map(|f| f.feed_url.as_str()).collect();
    dedup
        .tracked_feeds()
        .into_iter()
        .filter(|url| !current.contains(url.as_str()))
        .collect()
}

/// Drops the feeds' bookkeeping and forgets every seen URL.
pub fn apply(dedup: &mut DedupStore, vanished: &[String]) {
    dedup.forget_feeds(vanished);
    dedup.clear_seen();
}
