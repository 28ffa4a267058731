//! In-process backend used in tests and local development.

use super::{RecordBackend, StoreError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryBackend {
    items: RwLock<HashMap<String, Value>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RecordBackend for InMemoryBackend {
    async fn get_item(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))?;
        Ok(items.get(key).cloned())
    }

    async fn put_item(&self, key: &str, item: Value) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))?;
        items.insert(key.to_string(), item);
        Ok(())
    }

    async fn delete_item(&self, key: &str) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))?;
        items.remove(key);
        Ok(())
    }
}
