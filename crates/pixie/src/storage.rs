pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::StorageResult;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;

/// A partial view of the store: key to JSON value.
pub type Record = Map<String, Value>;

/// Asynchronous string-keyed store of JSON values.
///
/// Each call is atomic on its own. There are no transactions across calls,
/// and concurrent writers see last-write-wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the given keys. Absent keys are missing from the result.
    async fn get(&self, keys: &[&str]) -> StorageResult<Record>;
    /// Write every entry of the record, replacing existing values.
    async fn set(&self, record: Record) -> StorageResult<()>;
    /// Delete the given keys. Absent keys are ignored.
    async fn remove(&self, keys: &[&str]) -> StorageResult<()>;
}

pub type SharedKeyValueStore = Arc<dyn KeyValueStore>;
