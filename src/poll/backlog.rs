use crate::feed::normalize::FeedDescriptor;
use crate::fetch::Entry;
use crate::store::DedupStore;
use crate::submit::Submitter;
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::poll::{Phase as PollPhase, Poll};

use super::engine::{submit_unseen, PollContext};
use super::types::FeedSummary;

/// One-time import for a feed with a backlog source that has not been imported yet.
/// The feed is marked done at the end whatever happened along the way.
pub(super) async fn reconcile(
    ctx: &PollContext,
    submitter: &dyn Submitter,
    dedup: &mut DedupStore,
    feed: &FeedDescriptor,
    summary: &mut FeedSummary,
    log: &LogCtx<Poll>,
) {
    let Some(source) = feed.backlog_source.as_deref() else { return };
    if dedup.is_backlog_done(&feed.feed_url) { return; }

    let _s = log
        .span_kv(&PollPhase::Backlog, [("feed", feed.feed_url.clone()), ("source", source.to_string())])
        .entered();

    let candidates: Vec<Entry> = if source == feed.feed_url {
        // RSS backlog: whatever the feed itself still lists
        match ctx.source.fetch_entries(source).await {
            Ok(entries) => entries,
            Err(e) => {
                log.warn_kv("⚠️ Backlog fetch failed", [("feed", feed.feed_url.clone()), ("error", e.to_string())]);
                Vec::new()
            }
        }
    } else {
        ctx.catalog.list_video_urls(source).await.into_iter().map(Entry::new).collect()
    };
    log.info(format!("📚 Backlog {} — {} candidate(s)", feed.display_name, candidates.len()));

    let tally = submit_unseen(submitter, dedup, &feed.feed_url, candidates, log).await;
    dedup.mark_backlog_done(&feed.feed_url);
    dedup.record(&feed.feed_url, tally.accepted);

    summary.backlog_sent += tally.accepted;
    summary.skipped += tally.skipped;
    summary.rejected += tally.rejected;
}
