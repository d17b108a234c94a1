use std::path::Path;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use url::Url;

use crate::config::FeederConfig;
use crate::fetch::HttpFeedSource;
use crate::telemetry::{self};
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::feed::{Feed, Phase as FeedPhase};

mod edit;
pub mod normalize;
pub mod types;
pub mod youtube;

use normalize::{FeedRecord, RawFeed};

/// feeder feed add/rm/ls
#[derive(Args)]
pub struct FeedCmd {
    #[command(subcommand)]
    pub cmd: FeedSub,
}

#[derive(Subcommand)]
pub enum FeedSub {
    // add or update a feed (plan-only by default; use --apply to write)
    Add {
        /// Feed URL; may be omitted when --channel-id or --line is given
        url: Option<String>,
        /// One-line form: "Name | RSS URL | Backlog URL"
        #[arg(long, conflicts_with = "url")]
        line: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// Backlog source: the feed URL itself, or a channel/playlist URL
        #[arg(long)]
        backlog: Option<String>,
        #[arg(long)]
        channel_id: Option<String>,
        /// all | videos | shorts | live (with --channel-id)
        #[arg(long)]
        feed_type: Option<String>,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    // remove a feed; its stats and the seen set are pruned on the next poll
    Rm {
        url: String,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    // list normalized feeds
    Ls,
}

pub async fn run(config_path: &Path, args: FeedCmd) -> Result<()> {
    match args.cmd {
        FeedSub::Add { url, line, name, backlog, channel_id, feed_type, apply } => {
            let rec = match line {
                Some(l) => match normalize::parse_line(&l) {
                    Some(r) => r,
                    None => bail!("Could not parse feed line: {}", l),
                },
                None => FeedRecord {
                    url: url.unwrap_or_default(),
                    name,
                    backlog_playlist_url: backlog,
                    channel_id,
                    feed_type,
                },
            };
            add_feed(config_path, rec, apply).await
        }
        FeedSub::Rm { url, apply } => remove_feed(config_path, url, apply),
        FeedSub::Ls => ls_feeds(config_path),
    }
}

async fn add_feed(config_path: &Path, mut rec: FeedRecord, apply: bool) -> Result<()> {
    let log = telemetry::feed();
    let resolved = RawFeed::Structured(rec.clone()).resolved_url();
    let _g = log.root_span_kv([
        ("mode", if apply { "apply".to_string() } else { "plan".to_string() }),
        ("url", resolved.clone()),
        ("name", format!("{:?}", rec.name)),
        ("backlog", format!("{:?}", rec.backlog_playlist_url)),
    ]).entered();

    // URL validation (friendly error before touching the config)
    if resolved.is_empty() { bail!("Provide a feed URL, --channel-id or --line"); }
    if Url::parse(&resolved).is_err() { bail!("Invalid URL: {}", resolved); }
    if let Some(b) = rec.backlog_playlist_url.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        if Url::parse(b).is_err() { bail!("Invalid backlog URL: {}", b); }
    }

    if !apply {
        let _s = log.span(&FeedPhase::Plan).entered();
        log.info(format!("📝 Feed plan — add url={} name={:?} backlog={:?}", resolved, rec.name, rec.backlog_playlist_url));
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            let plan = types::FeedAddPlan { action: "add", feed: rec };
            log.plan(&plan)?;
        }
        return Ok(());
    }
    let _s = log.span(&FeedPhase::Add).entered();
    let mut cfg = FeederConfig::load_file(config_path)?;
    let unnamed = rec.name.as_deref().map_or(true, |n| n.trim().is_empty());
    if unnamed && !edit::contains_feed(&cfg, &resolved) {
        rec.name = Some(fetch_feed_name(&resolved, &log).await);
    }
    let inserted = edit::upsert_feed(&mut cfg, rec);
    cfg.save(config_path)?;
    if inserted { log.info("➕ Feed added"); } else { log.info("♻️ Feed updated"); }
    if telemetry::config::json_mode() {
        let result = types::FeedAddResult { inserted, url: resolved };
        log.result(&result)?;
    }
    Ok(())
}

/// Title advertised by the feed itself, or the URL when it cannot be read.
async fn fetch_feed_name(feed_url: &str, log: &LogCtx<Feed>) -> String {
    let fetched = match HttpFeedSource::new() {
        Ok(source) => source.fetch_title(feed_url).await,
        Err(e) => Err(e),
    };
    match fetched {
        Ok(Some(title)) => {
            log.info(format!("🏷️  Named from feed title: {}", title));
            title
        }
        Ok(None) => feed_url.to_string(),
        Err(e) => {
            log.warn(format!("⚠️ Could not read feed title ({}); using the URL as name", e));
            feed_url.to_string()
        }
    }
}

fn remove_feed(config_path: &Path, url: String, apply: bool) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span_kv([
        ("mode", if apply { "apply".to_string() } else { "plan".to_string() }),
        ("url", url.clone()),
    ]).entered();

    let mut cfg = FeederConfig::load_file(config_path)?;
    if !apply {
        let _s = log.span(&FeedPhase::Plan).entered();
        let present = cfg.rss_feeds.iter().any(|f| f.resolved_url() == url.trim());
        log.info(format!("📝 Feed plan — remove url={} present={}", url, present));
        if present { log.info("   The next poll forgets its stats and clears the seen set."); }
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            let plan = types::FeedRemovePlan { action: "remove", url, present };
            log.plan(&plan)?;
        }
        return Ok(());
    }
    let _s = log.span(&FeedPhase::Remove).entered();
    let removed = edit::remove_feed(&mut cfg, &url);
    if removed {
        cfg.save(config_path)?;
        log.info("➖ Feed removed");
    } else {
        log.warn(format!("No feed configured for {}", url));
    }
    if telemetry::config::json_mode() {
        let result = types::FeedRemoveResult { removed, url };
        log.result(&result)?;
    }
    Ok(())
}

fn ls_feeds(config_path: &Path) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span().entered();
    let _s = log.span(&FeedPhase::List).entered();
    let cfg = FeederConfig::load(config_path)?;
    let feeds = normalize::normalize(&cfg.rss_feeds);
    log.info(format!("📡 Feeds ({}):", feeds.len()));
    for f in &feeds {
        log.info(format!(
            "  {} <{}> backlog={}",
            f.display_name,
            f.feed_url,
            f.backlog_source.as_deref().unwrap_or("-")
        ));
    }
    if telemetry::config::json_mode() {
        let list = types::FeedList { feeds };
        log.result(&list)?;
    }
    Ok(())
}
