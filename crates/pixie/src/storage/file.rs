use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{KeyValueStore, Record};
use crate::error::{StorageError, StorageResult};

/// Key-value store kept as a single JSON object on disk.
///
/// Writes go to a sibling temp file that is then renamed over the original,
/// so a crash mid-write leaves the previous contents intact.
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StorageResult<Record> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Record::new())
            }
            Err(error) => return Err(error.into()),
        };
        match serde_json::from_slice(&bytes)? {
            Value::Object(record) => Ok(record),
            _ => Err(StorageError::Unavailable(format!(
                "storage file {} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn store(&self, record: &Record) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let serialized = serde_json::to_vec_pretty(record)?;
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, serialized).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, keys: &[&str]) -> StorageResult<Record> {
        let mut data = self.load().await?;
        Ok(keys
            .iter()
            .filter_map(|key| data.remove(*key).map(|value| (key.to_string(), value)))
            .collect())
    }

    async fn set(&self, record: Record) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        data.extend(record);
        self.store(&data).await
    }

    async fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let before = data.len();
        for key in keys {
            data.remove(*key);
        }
        if data.len() == before {
            return Ok(());
        }
        self.store(&data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("object")
    }

    #[tokio::test]
    async fn writes_and_reads_json() {
        let dir = tempdir().expect("tempdir");
        let kv = FileKeyValueStore::new(dir.path().join("nested").join("store.json"));
        kv.set(record(json!({"color_history": [], "active_output_format": "lab"})))
            .await
            .expect("set");

        let loaded = kv.get(&["active_output_format"]).await.expect("get");
        assert_eq!(loaded, record(json!({"active_output_format": "lab"})));
        assert!(kv.path().exists());
    }

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let dir = tempdir().expect("tempdir");
        let kv = FileKeyValueStore::new(dir.path().join("store.json"));
        let loaded = kv.get(&["anything"]).await.expect("get");
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn survives_reopen_and_remove() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        {
            let kv = FileKeyValueStore::new(path.clone());
            kv.set(record(json!({"a": 1, "b": 2}))).await.expect("set");
            kv.remove(&["a"]).await.expect("remove");
        }

        let kv = FileKeyValueStore::new(path);
        let loaded = kv.get(&["a", "b"]).await.expect("get");
        assert_eq!(loaded, record(json!({"b": 2})));
    }

    #[tokio::test]
    async fn non_object_file_is_unavailable() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[1, 2, 3]").expect("write");

        let kv = FileKeyValueStore::new(path);
        let err = kv.get(&["a"]).await.expect_err("not an object");
        match err {
            StorageError::Unavailable(_) => {}
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").expect("write");

        let kv = FileKeyValueStore::new(path);
        let err = kv.get(&["a"]).await.expect_err("corrupt");
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
