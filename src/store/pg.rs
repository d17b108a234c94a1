use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{DocumentStore, PersistedDocument, StoreError};

/// Key-value rows in `feeder.state`, one JSONB document per instance.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(dsn)
            .await?;
        Ok(Self { pool })
    }

    /// Idempotent; run by `feeder init`.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query("CREATE SCHEMA IF NOT EXISTS feeder")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeder.state (
                key        TEXT PRIMARY KEY,
                doc        JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn load(&self, key: &str) -> Result<Option<PersistedDocument>, StoreError> {
        let row: Option<serde_json::Value> = sqlx::query_scalar("SELECT doc FROM feeder.state WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, key: &str, doc: &PersistedDocument) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO feeder.state (key, doc, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key)
            DO UPDATE SET doc = EXCLUDED.doc, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(Json(doc))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn describe(&self) -> String { "postgres:feeder.state".to_string() }
}
