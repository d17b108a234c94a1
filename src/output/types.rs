use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Bumped whenever a `feeder` command changes the shape of its plan or result body.
pub const SCHEMA_VERSION: &str = "feeder.v1";

/// Which instance and state store a command ran against, and how long it took.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

impl Meta {
    pub fn for_instance(instance: impl Into<String>, store: impl Into<String>) -> Self {
        Self { duration_ms: None, instance: Some(instance.into()), store: Some(store.into()) }
    }

    pub fn took(mut self, elapsed: Duration) -> Self {
        self.duration_ms = Some(elapsed.as_millis());
        self
    }
}

/// One line on stdout per command in `--json` mode. Plan-only runs carry `plan`,
/// `--apply` runs (and every poll cycle under `feeder run`) carry `result`.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub schema_version: &'static str,
    pub time: DateTime<Utc>,
    pub request_id: Uuid,
    pub op: &'static str,
    pub apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope {
    pub fn plan<T: Serialize>(op: &'static str, plan: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        Ok(Self::stamp(op, false, Some(serde_json::to_value(plan)?), None, meta))
    }

    pub fn result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        Ok(Self::stamp(op, true, None, Some(serde_json::to_value(result)?), meta))
    }

    fn stamp(op: &'static str, apply: bool, plan: Option<Value>, result: Option<Value>, meta: Option<Meta>) -> Self {
        Envelope {
            schema_version: SCHEMA_VERSION,
            time: Utc::now(),
            request_id: Uuid::new_v4(),
            op,
            apply,
            plan,
            result,
            meta,
        }
    }
}
