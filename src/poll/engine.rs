use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::catalog::CatalogLister;
use crate::feed::normalize::FeedDescriptor;
use crate::fetch::{Entry, FeedSource};
use crate::store::{DedupStore, DocumentStore};
use crate::submit::Submitter;
use crate::telemetry::{self};
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::poll::{Phase as PollPhase, Poll};

use super::types::{CycleReport, CycleResult, FeedSummary, SkipReason};
use super::{backlog, prune};

/// Everything one instance needs for a cycle. Built fresh from the config before each cycle.
pub struct PollContext {
    pub instance: String,
    /// `rss_feeds` entries before normalization. Only an empty config list skips the cycle;
    /// a list whose entries all normalize away still loads and prunes.
    pub configured_feeds: usize,
    pub feeds: Vec<FeedDescriptor>,
    pub store: Arc<dyn DocumentStore>,
    pub source: Arc<dyn FeedSource>,
    /// None when no MeTube URL is configured.
    pub submitter: Option<Arc<dyn Submitter>>,
    pub catalog: Arc<dyn CatalogLister>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct Tally {
    pub accepted: u64,
    pub skipped: u64,
    pub rejected: u64,
}

/// Load, prune, backlog pass, incremental pass, persist. Never returns an error.
pub async fn run_cycle(ctx: &PollContext) -> CycleResult {
    let log = telemetry::poll();
    let Some(submitter) = ctx.submitter.as_deref() else {
        log.warn(format!("⏭️  Skipping poll for {}: {}", ctx.instance, SkipReason::NoEndpoint));
        return CycleResult::Skipped { reason: SkipReason::NoEndpoint };
    };
    if ctx.configured_feeds == 0 {
        log.info(format!("⏭️  Skipping poll for {}: {}", ctx.instance, SkipReason::NoFeeds));
        return CycleResult::Skipped { reason: SkipReason::NoFeeds };
    }

    let _g = log
        .root_span_kv([("instance", ctx.instance.clone()), ("feeds", ctx.feeds.len().to_string())])
        .entered();
    let started = Instant::now();
    match cycle(ctx, submitter, &log).await {
        Ok(report) => {
            log.totals(report.feeds.len(), report.total_sent, report.total_skipped, report.total_rejected, report.fetch_errors);
            log.info(format!("🏁 Poll finished in {} ms", started.elapsed().as_millis()));
            CycleResult::Completed(report)
        }
        Err(e) => {
            log.warn(format!("❌ Poll cycle failed: {:#}", e));
            CycleResult::Failed { error: format!("{:#}", e) }
        }
    }
}

async fn cycle(ctx: &PollContext, submitter: &dyn Submitter, log: &LogCtx<Poll>) -> Result<CycleReport> {
    let mut dedup = load(ctx, log).await;

    let pruned = {
        let _s = log.span(&PollPhase::Prune).entered();
        let vanished = prune::vanished_feeds(&dedup, &ctx.feeds);
        if !vanished.is_empty() {
            prune::apply(&mut dedup, &vanished);
            log.info_kv("🧹 Removed feeds forgotten, seen set cleared", [("feeds", vanished.join(","))]);
            // saved right away so the prune sticks even if the rest of the cycle fails
            if let Err(e) = ctx.store.save(&ctx.instance, &dedup.to_document()).await {
                log.warn(format!("⚠️ Could not persist prune: {}", e));
            }
        }
        vanished
    };

    let mut summaries: Vec<FeedSummary> = ctx.feeds.iter().map(FeedSummary::for_feed).collect();

    for (feed, summary) in ctx.feeds.iter().zip(summaries.iter_mut()) {
        backlog::reconcile(ctx, submitter, &mut dedup, feed, summary, log).await;
    }

    for (feed, summary) in ctx.feeds.iter().zip(summaries.iter_mut()) {
        poll_feed(ctx, submitter, &mut dedup, feed, summary, log).await;
        log.feed_summary(&summary.feed_url, summary.backlog_sent, summary.sent, summary.skipped, summary.rejected);
    }

    {
        let _s = log.span(&PollPhase::Persist).entered();
        ctx.store
            .save(&ctx.instance, &dedup.to_document())
            .await
            .with_context(|| format!("persisting state to {}", ctx.store.describe()))?;
    }

    Ok(CycleReport::new(ctx.instance.clone(), pruned, summaries, dedup.seen_len()))
}

async fn load(ctx: &PollContext, log: &LogCtx<Poll>) -> DedupStore {
    let _s = log.span(&PollPhase::Load).entered();
    match ctx.store.load(&ctx.instance).await {
        Ok(Some(doc)) => DedupStore::from_document(doc),
        Ok(None) => {
            log.info(format!("ℹ️  No saved state for {}; starting fresh", ctx.instance));
            DedupStore::default()
        }
        Err(e) => {
            log.warn(format!("⚠️ Could not load state ({}); starting empty", e));
            DedupStore::default()
        }
    }
}

async fn poll_feed(
    ctx: &PollContext,
    submitter: &dyn Submitter,
    dedup: &mut DedupStore,
    feed: &FeedDescriptor,
    summary: &mut FeedSummary,
    log: &LogCtx<Poll>,
) {
    let _s = log.span_kv(&PollPhase::Feed, [("feed", feed.feed_url.clone())]).entered();
    let fetched = {
        let _f = log.span(&PollPhase::Fetch).entered();
        ctx.source.fetch_entries(&feed.feed_url).await
    };
    match fetched {
        Ok(entries) => {
            let tally = submit_unseen(submitter, dedup, &feed.feed_url, entries, log).await;
            dedup.record(&feed.feed_url, tally.accepted);
            summary.sent += tally.accepted;
            summary.skipped += tally.skipped;
            summary.rejected += tally.rejected;
        }
        Err(e) => {
            let msg = if e.is_unreachable() { "⚠️ Feed unreachable" } else { "⚠️ Feed unreadable" };
            log.warn_kv(msg, [("feed", feed.feed_url.clone()), ("error", e.to_string())]);
            dedup.record(&feed.feed_url, 0);
            summary.fetch_error = Some(e.to_string());
        }
    }
}

/// Submits every entry not seen yet. Each URL is marked seen before the attempt,
/// so a failed submission is never retried.
pub(super) async fn submit_unseen<I>(
    submitter: &dyn Submitter,
    dedup: &mut DedupStore,
    feed_url: &str,
    entries: I,
    log: &LogCtx<Poll>,
) -> Tally
where
    I: IntoIterator<Item = Entry>,
{
    let _s = log.span(&PollPhase::Submit).entered();
    let mut tally = Tally::default();
    for entry in entries {
        if dedup.is_seen(&entry.link) {
            tally.skipped += 1;
            continue;
        }
        dedup.mark_seen(&entry.link);
        match submitter.submit(&entry.link).await {
            Ok(accepted) => {
                tally.accepted += 1;
                match entry.title.as_deref() {
                    Some(title) => log.info(format!("📤 Sent \"{}\" {} ({})", title, entry.link, accepted.status)),
                    None => log.info(format!("📤 Sent {} ({})", entry.link, accepted.status)),
                }
            }
            Err(e) => {
                tally.rejected += 1;
                let msg = if e.is_unreachable() { "⚠️ MeTube unreachable" } else { "⚠️ MeTube refused" };
                log.warn_kv(msg, [
                    ("feed", feed_url.to_string()),
                    ("url", entry.link.clone()),
                    ("error", e.to_string()),
                ]);
            }
        }
    }
    tally
}
