use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod dedup;
pub mod file;
pub mod pg;
#[cfg(test)]
pub mod memory;

pub use dedup::DedupStore;

/// Per-feed counters shown on the dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStat {
    pub last_fetched: DateTime<Utc>,
    pub total_sent: u64,
}

/// The single durable record per instance. All three fields are always written together.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDocument {
    // older documents only carried `urls`
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub backlog_done: Vec<String>,
    #[serde(default)]
    pub feed_stats: BTreeMap<String, FeedStat>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Ok(None) when nothing was saved under `key` yet.
    async fn load(&self, key: &str) -> Result<Option<PersistedDocument>, StoreError>;
    async fn save(&self, key: &str, doc: &PersistedDocument) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Corrupt(serde_json::Error),
    Database(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "store io error: {err}"),
            StoreError::Corrupt(err) => write!(f, "stored document is corrupt: {err}"),
            StoreError::Database(err) => write!(f, "store database error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Corrupt(err) => Some(err),
            StoreError::Database(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self { StoreError::Io(err) }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self { StoreError::Corrupt(err) }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self { StoreError::Database(err) }
}

/// Where documents live: Postgres when a DSN is given, else one JSON file per instance.
pub enum StoreTarget {
    Postgres(String),
    Files(PathBuf),
}

impl StoreTarget {
    pub fn resolve(dsn: Option<String>, state_dir: PathBuf) -> Self {
        match dsn.or_else(|| std::env::var("DATABASE_URL").ok()).filter(|d| !d.trim().is_empty()) {
            Some(dsn) => StoreTarget::Postgres(dsn),
            None => StoreTarget::Files(state_dir),
        }
    }

    pub async fn open(&self) -> Result<Arc<dyn DocumentStore>> {
        let store: Arc<dyn DocumentStore> = match self {
            StoreTarget::Postgres(dsn) => Arc::new(pg::PgStore::connect(dsn).await?),
            StoreTarget::Files(dir) => Arc::new(file::JsonFileStore::new(dir.clone())),
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_document_with_only_urls_loads() {
        let doc: PersistedDocument = serde_json::from_str(r#"{"urls": ["https://x/v1"]}"#).unwrap();
        assert_eq!(doc.urls, vec!["https://x/v1"]);
        assert!(doc.backlog_done.is_empty());
        assert!(doc.feed_stats.is_empty());
    }

    #[test]
    fn stats_use_iso8601_timestamps() {
        let raw = r#"{"urls": [], "backlog_done": ["https://f/1"], "feed_stats": {
            "https://f/1": {"last_fetched": "2024-05-01T10:00:00+00:00", "total_sent": 4}
        }}"#;
        let doc: PersistedDocument = serde_json::from_str(raw).unwrap();
        let stat = &doc.feed_stats["https://f/1"];
        assert_eq!(stat.total_sent, 4);
        assert_eq!(stat.last_fetched.to_rfc3339(), "2024-05-01T10:00:00+00:00");

        let out = serde_json::to_value(&doc).unwrap();
        assert_eq!(out["feed_stats"]["https://f/1"]["last_fetched"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn target_prefers_dsn() {
        let t = StoreTarget::resolve(Some("postgres://localhost/feeder".into()), PathBuf::from("state"));
        assert!(matches!(t, StoreTarget::Postgres(_)));
    }
}
