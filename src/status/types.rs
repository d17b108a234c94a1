use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedStatus {
    pub feed_url: String,
    pub name: String,
    pub total_sent: u64,
    pub last_fetched: Option<DateTime<Utc>>,
    pub backlog_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlog_source: Option<String>,
    pub backlog_done: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub instance: String,
    pub store: String,
    pub metube_url: Option<String>,
    pub quality: String,
    pub scan_interval_secs: Option<u64>,
    pub feed_count: usize,
    pub seen: usize,
    pub feeds: Vec<FeedStatus>,
}
