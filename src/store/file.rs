use std::path::PathBuf;

use async_trait::async_trait;

use super::{DocumentStore, PersistedDocument, StoreError};
use crate::config::tmp_path;

/// One JSON document per instance key under a state directory.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Self { Self { dir } }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }

    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn load(&self, key: &str) -> Result<Option<PersistedDocument>, StoreError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, key: &str, doc: &PersistedDocument) -> Result<(), StoreError> {
        self.ensure_dir().await?;
        let path = self.path_for(key);
        let tmp = tmp_path(&path);
        let body = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    fn describe(&self) -> String { format!("files:{}", self.dir.display()) }
}
