use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;

use crate::catalog::YtDlpCatalog;
use crate::config::FeederConfig;
use crate::feed::normalize;
use crate::fetch::HttpFeedSource;
use crate::output::types::Meta;
use crate::store::{DedupStore, DocumentStore, StoreTarget};
use crate::submit::{MetubeClient, MetubeClientConfig, Submitter};
use crate::telemetry::{self};
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::poll::{Phase as PollPhase, Poll};

mod backlog;
pub mod engine;
pub mod prune;
pub mod types;

pub use engine::{run_cycle, PollContext};
pub use types::CycleResult;

/// feeder poll: one cycle (plan-only by default; use --apply to submit)
#[derive(Args, Debug)]
pub struct PollCmd {
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

/// Wires the real HTTP clients, yt-dlp and the given store around a config snapshot.
pub fn build_context(cfg: &FeederConfig, store: Arc<dyn DocumentStore>) -> Result<PollContext> {
    let submitter: Option<Arc<dyn Submitter>> = match MetubeClientConfig::from_config(cfg) {
        Some(client_cfg) => Some(Arc::new(MetubeClient::new(client_cfg)?) as Arc<dyn Submitter>),
        None => None,
    };
    Ok(PollContext {
        instance: cfg.instance.clone(),
        configured_feeds: cfg.rss_feeds.len(),
        feeds: normalize::normalize(&cfg.rss_feeds),
        store,
        source: Arc::new(HttpFeedSource::new()?),
        submitter,
        catalog: Arc::new(YtDlpCatalog::from_env()),
    })
}

pub async fn run(config_path: &Path, target: &StoreTarget, args: PollCmd) -> Result<()> {
    let log = telemetry::poll();
    let cfg = FeederConfig::load(config_path)?;
    let store = target.open().await?;
    let ctx = build_context(&cfg, store)?;

    if !args.apply {
        let _g = log.root_span_kv([("mode", "plan".to_string()), ("instance", ctx.instance.clone())]).entered();
        let _sp = log.span(&PollPhase::Plan).entered();
        let plan = plan(&ctx, cfg.add_endpoint(), &log).await;
        if telemetry::config::json_mode() {
            log.plan(&plan)?;
        } else {
            log.info(format!(
                "📝 Poll plan — instance={} store={} endpoint={} feeds={} seen={}",
                plan.instance, plan.store, plan.endpoint.as_deref().unwrap_or("<unset>"), plan.feeds.len(), plan.seen
            ));
            for f in &plan.feeds {
                log.info(format!("  {} ({}){}", f.name, f.feed_url, if f.backlog_pending { " [backlog pending]" } else { "" }));
            }
            for v in &plan.vanished {
                log.info(format!("  removed: {} (seen set will be cleared)", v));
            }
            log.info("   Use --apply to poll and submit.");
        }
        return Ok(());
    }

    let started = Instant::now();
    let result = run_cycle(&ctx).await;
    if telemetry::config::json_mode() {
        let meta = Meta::for_instance(ctx.instance.clone(), ctx.store.describe()).took(started.elapsed());
        log.result_with_meta(&result, meta)?;
    }
    Ok(())
}

/// Read-only preview: what the next cycle would touch.
async fn plan(ctx: &PollContext, endpoint: Option<String>, log: &LogCtx<Poll>) -> types::PollPlan {
    let dedup = match ctx.store.load(&ctx.instance).await {
        Ok(Some(doc)) => DedupStore::from_document(doc),
        Ok(None) => DedupStore::default(),
        Err(e) => {
            log.warn(format!("⚠️ Could not load state ({}); the next cycle would start empty", e));
            DedupStore::default()
        }
    };
    types::PollPlan {
        instance: ctx.instance.clone(),
        store: ctx.store.describe(),
        endpoint,
        feeds: ctx
            .feeds
            .iter()
            .map(|f| types::PlannedFeed {
                feed_url: f.feed_url.clone(),
                name: f.display_name.clone(),
                backlog_pending: f.wants_backlog() && !dedup.is_backlog_done(&f.feed_url),
            })
            .collect(),
        vanished: prune::vanished_feeds(&dedup, &ctx.feeds),
        seen: dedup.seen_len(),
    }
}
