use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::FeederConfig;
use crate::store::file::JsonFileStore;
use crate::store::pg::PgStore;
use crate::store::StoreTarget;
use crate::telemetry::{self};
use crate::telemetry::ops::init::Phase as InitPhase;

#[derive(Debug, Serialize)]
struct InitResult {
    store: String,
    config: String,
    config_created: bool,
}

/// Prepares the state store and writes a starter config when none exists. Idempotent.
pub async fn run(config_path: &Path, target: &StoreTarget) -> Result<()> {
    let log = telemetry::init();
    let _g = log.root_span_kv([("config", config_path.display().to_string())]).entered();

    let store = {
        let _s = log.span(&InitPhase::Schema).entered();
        match target {
            StoreTarget::Postgres(dsn) => {
                let pg = PgStore::connect(dsn).await.context("connecting to postgres")?;
                pg.ensure_schema().await.context("creating feeder.state")?;
                log.info("🗄️  Postgres schema ready (feeder.state)");
                "postgres:feeder.state".to_string()
            }
            StoreTarget::Files(dir) => {
                let files = JsonFileStore::new(dir.clone());
                files.ensure_dir().await.with_context(|| format!("creating {}", dir.display()))?;
                log.info(format!("📁 State directory ready ({})", dir.display()));
                format!("files:{}", dir.display())
            }
        }
    };

    let config_created = {
        let _s = log.span(&InitPhase::Config).entered();
        if config_path.exists() {
            log.info(format!("ℹ️  Keeping existing config {}", config_path.display()));
            false
        } else {
            FeederConfig::default().save(config_path)?;
            log.info(format!("📝 Wrote starter config {} (set metube_url and rss_feeds)", config_path.display()));
            true
        }
    };

    if telemetry::config::json_mode() {
        log.result(&InitResult { store, config: config_path.display().to_string(), config_created })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_state_dir_and_starter_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("feeder.json");
        let target = StoreTarget::Files(dir.path().join("state"));

        run(&config, &target).await.unwrap();
        assert!(dir.path().join("state").is_dir());
        let cfg = FeederConfig::load_file(&config).unwrap();
        assert_eq!(cfg.instance, "default");

        std::fs::write(&config, br#"{"metube_url": "http://metube:8081"}"#).unwrap();
        run(&config, &target).await.unwrap();
        assert_eq!(FeederConfig::load_file(&config).unwrap().metube_url, "http://metube:8081");
    }
}
