use serde::Serialize;

use crate::feed::normalize::FeedDescriptor;

/// What one cycle did for one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedSummary {
    pub feed_url: String,
    pub name: String,
    pub backlog_sent: u64,
    pub sent: u64,
    pub skipped: u64,
    pub rejected: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl FeedSummary {
    pub fn for_feed(feed: &FeedDescriptor) -> Self {
        Self { feed_url: feed.feed_url.clone(), name: feed.display_name.clone(), ..Default::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub instance: String,
    pub pruned: Vec<String>,
    pub feeds: Vec<FeedSummary>,
    pub total_sent: u64,
    pub total_skipped: u64,
    pub total_rejected: u64,
    pub fetch_errors: usize,
    pub seen: usize,
}

impl CycleReport {
    pub fn new(instance: String, pruned: Vec<String>, feeds: Vec<FeedSummary>, seen: usize) -> Self {
        let total_sent = feeds.iter().map(|f| f.backlog_sent + f.sent).sum();
        let total_skipped = feeds.iter().map(|f| f.skipped).sum();
        let total_rejected = feeds.iter().map(|f| f.rejected).sum();
        let fetch_errors = feeds.iter().filter(|f| f.fetch_error.is_some()).count();
        Self { instance, pruned, feeds, total_sent, total_skipped, total_rejected, fetch_errors, seen }
    }

    #[cfg(test)]
    pub fn feed(&self, feed_url: &str) -> Option<&FeedSummary> {
        self.feeds.iter().find(|f| f.feed_url == feed_url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoEndpoint,
    NoFeeds,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoEndpoint => f.write_str("no MeTube URL configured"),
            SkipReason::NoFeeds => f.write_str("no feeds configured"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleResult {
    Skipped { reason: SkipReason },
    Completed(CycleReport),
    Failed { error: String },
}

/// Dry-run view of the next cycle.
#[derive(Debug, Clone, Serialize)]
pub struct PollPlan {
    pub instance: String,
    pub store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub feeds: Vec<PlannedFeed>,
    pub vanished: Vec<String>,
    pub seen: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedFeed {
    pub feed_url: String,
    pub name: String,
    pub backlog_pending: bool,
}
