//! In-memory key-value store.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{KeyValueStore, Record};
use crate::error::StorageResult;

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    data: RwLock<Record>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing contents, e.g. data written by an older release.
    pub fn with_record(record: Record) -> Self {
        Self {
            data: RwLock::new(record),
        }
    }

    /// Copy of everything currently stored.
    pub fn snapshot(&self) -> Record {
        self.data.read().clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, keys: &[&str]) -> StorageResult<Record> {
        let data = self.data.read();
        Ok(keys
            .iter()
            .filter_map(|key| data.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set(&self, record: Record) -> StorageResult<()> {
        self.data.write().extend(record);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        let mut data = self.data.write();
        for key in keys {
            data.remove(*key);
        }
        Ok(())
    }
}
