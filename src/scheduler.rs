use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::Args;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::{FeederConfig, DEFAULT_SCAN_INTERVAL};
use crate::output::types::Meta;
use crate::poll::{self, CycleResult};
use crate::store::{DocumentStore, StoreTarget};
use crate::telemetry::{self};
use crate::telemetry::ops::run::Phase as RunPhase;
use crate::util::time::parse_interval;

/// feeder run: poll on a fixed cadence until Ctrl-C
#[derive(Args, Debug)]
pub struct RunCmd {
    /// Overrides scan_interval from the config (e.g. 30m, 1h)
    #[arg(long)]
    pub interval: Option<String>,
}

/// Fires `tick` immediately and then every `interval`. A slow tick delays the
/// next one instead of bursting. Cancellation is only observed between ticks.
pub struct Scheduler {
    interval: Duration,
    token: CancellationToken,
}

impl Scheduler {
    pub fn new(interval: Duration, token: CancellationToken) -> Self {
        let interval = if interval.is_zero() { DEFAULT_SCAN_INTERVAL } else { interval };
        Self { interval, token }
    }

    /// Returns how many ticks ran.
    pub async fn run<F, Fut>(&self, mut tick: F) -> usize
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0;
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tick().await;
            ticks += 1;
        }
        ticks
    }
}

pub async fn run(config_path: &Path, target: &StoreTarget, args: RunCmd) -> Result<()> {
    let log = telemetry::run();
    let interval = match args.interval.as_deref() {
        Some(s) => parse_interval(s).ok_or_else(|| anyhow!("invalid --interval {:?} (try 30m, 1h, 90s)", s))?,
        None => FeederConfig::load(config_path)?.interval()?,
    };
    let _g = log
        .root_span_kv([("interval_secs", interval.as_secs().to_string()), ("config", config_path.display().to_string())])
        .entered();

    let store = target.open().await?;
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    log.info(format!("⏱️  Polling every {}s (Ctrl-C to stop)", interval.as_secs()));
    let ticks = Scheduler::new(interval, token)
        .run(|| {
            let store = store.clone();
            async move { tick(config_path, store).await }
        })
        .await;
    log.info(format!("👋 Stopped after {} cycle(s)", ticks));
    Ok(())
}

// Config is re-read every tick so feed edits apply without a restart.
async fn tick(config_path: &Path, store: Arc<dyn DocumentStore>) {
    let log = telemetry::run();
    let _s = log.span(&RunPhase::Tick).entered();
    let ctx = match FeederConfig::load(config_path).and_then(|cfg| poll::build_context(&cfg, store)) {
        Ok(ctx) => ctx,
        Err(e) => {
            log.warn(format!("⚠️ Skipping cycle, config unusable: {:#}", e));
            return;
        }
    };
    let started = Instant::now();
    let result = poll::run_cycle(&ctx).await;
    match &result {
        CycleResult::Completed(r) => log.info(format!("✅ Cycle done — feeds={} sent={}", r.feeds.len(), r.total_sent)),
        CycleResult::Skipped { reason } => log.info(format!("⏭️  Cycle skipped: {}", reason)),
        CycleResult::Failed { error } => log.warn(format!("❌ Cycle failed: {}", error)),
    }
    if telemetry::config::json_mode() {
        let meta = Meta::for_instance(ctx.instance.clone(), ctx.store.describe()).took(started.elapsed());
        if let Err(e) = log.result_with_meta(&result, meta) {
            log.warn(format!("⚠️ Could not emit result: {}", e));
        }
    }
}
