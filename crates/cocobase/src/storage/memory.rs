/*
[INPUT]:  Session keys and values
[OUTPUT]: In-process key/value map
[POS]:    Storage layer - volatile backend for tests and short-lived processes
[UPDATE]: When the Storage trait changes
*/

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Storage;
use crate::http::Result;

/// Storage backed by a `HashMap`; contents are lost on drop
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.write().await.remove(key);
        Ok(())
    }
}
