use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::config::FeederConfig;
use crate::feed::normalize::{self, FeedDescriptor};
use crate::store::{DedupStore, StoreTarget};
use crate::telemetry::{self};
use crate::telemetry::ops::status::Phase as StatusPhase;

pub mod types;

use types::{FeedStatus, StatusReport};

/// feeder status: per-feed counters from the persisted state
#[derive(Args, Debug)]
pub struct StatusCmd {}

pub async fn run(config_path: &Path, target: &StoreTarget, _args: StatusCmd) -> Result<()> {
    let log = telemetry::status();
    let _g = log.root_span_kv([("config", config_path.display().to_string())]).entered();

    let cfg = FeederConfig::load(config_path)?;
    let store = target.open().await?;
    let dedup = {
        let _s = log.span(&StatusPhase::Load).entered();
        match store.load(&cfg.instance).await {
            Ok(Some(doc)) => DedupStore::from_document(doc),
            Ok(None) => DedupStore::default(),
            Err(e) => {
                log.warn(format!("⚠️ Could not read state ({}); showing empty counters", e));
                DedupStore::default()
            }
        }
    };

    let _s = log.span(&StatusPhase::Report).entered();
    let feeds = normalize::normalize(&cfg.rss_feeds);
    let report = StatusReport {
        instance: cfg.instance.clone(),
        store: store.describe(),
        metube_url: cfg.base_url(),
        quality: cfg.quality.to_string(),
        scan_interval_secs: cfg.interval().ok().map(|d| d.as_secs()),
        feed_count: feeds.len(),
        seen: dedup.seen_len(),
        feeds: build_rows(&feeds, &dedup),
    };

    if telemetry::config::json_mode() {
        log.result(&report)?;
    } else {
        log.info(format!(
            "📡 {} — metube={} quality={} feeds={} seen={}",
            report.instance,
            report.metube_url.as_deref().unwrap_or("<unset>"),
            report.quality,
            report.feed_count,
            report.seen
        ));
        for row in &report.feeds {
            let last = row.last_fetched.map(|t| t.to_rfc3339()).unwrap_or_else(|| "never".to_string());
            let backlog = match (row.backlog_enabled, row.backlog_done) {
                (false, _) => "off",
                (true, false) => "pending",
                (true, true) => "done",
            };
            log.info(format!("  {} — sent={} last_fetched={} backlog={}", row.name, row.total_sent, last, backlog));
        }
    }
    Ok(())
}

/// One row per configured feed, in configuration order.
pub fn build_rows(feeds: &[FeedDescriptor], dedup: &DedupStore) -> Vec<FeedStatus> {
    feeds
        .iter()
        .map(|f| {
            let stat = dedup.stats().get(&f.feed_url);
            FeedStatus {
                feed_url: f.feed_url.clone(),
                name: f.display_name.clone(),
                total_sent: stat.map(|s| s.total_sent).unwrap_or(0),
                last_fetched: stat.map(|s| s.last_fetched),
                backlog_enabled: f.wants_backlog(),
                backlog_source: f.backlog_source.clone(),
                backlog_done: dedup.is_backlog_done(&f.feed_url),
            }
        })
        .collect()
}
