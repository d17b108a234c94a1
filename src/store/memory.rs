use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{DocumentStore, PersistedDocument, StoreError};

/// In-process store for tests; can be told to fail loads or saves.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, PersistedDocument>>,
    saves: Mutex<usize>,
    fail_load: Mutex<bool>,
    fail_save: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_document(key: &str, doc: PersistedDocument) -> Self {
        let s = Self::default();
        s.docs.lock().unwrap().insert(key.to_string(), doc);
        s
    }

    pub fn document(&self, key: &str) -> Option<PersistedDocument> {
        self.docs.lock().unwrap().get(key).cloned()
    }

    pub fn save_count(&self) -> usize { *self.saves.lock().unwrap() }

    pub fn fail_loads(&self, v: bool) { *self.fail_load.lock().unwrap() = v; }

    pub fn fail_saves(&self, v: bool) { *self.fail_save.lock().unwrap() = v; }
}

fn injected() -> StoreError {
    StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "injected failure"))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<PersistedDocument>, StoreError> {
        if *self.fail_load.lock().unwrap() { return Err(injected()); }
        Ok(self.document(key))
    }

    async fn save(&self, key: &str, doc: &PersistedDocument) -> Result<(), StoreError> {
        if *self.fail_save.lock().unwrap() { return Err(injected()); }
        *self.saves.lock().unwrap() += 1;
        self.docs.lock().unwrap().insert(key.to_string(), doc.clone());
        Ok(())
    }

    fn describe(&self) -> String { "memory".to_string() }
}
