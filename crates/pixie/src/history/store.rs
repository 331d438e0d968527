//! Persisted color history and the output-format preference.

use std::future::Future;

use serde_json::Value;
use tokio::sync::Mutex;

use super::entry::HistoryEntry;
use super::sanitize::{migrate_legacy, sanitize_history};
use crate::color::FormatId;
use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult, StorageError, StorageResult};
use crate::storage::{Record, SharedKeyValueStore};

/// Current history, newest first.
pub const HISTORY_KEY: &str = "color_history";
/// Selected output format.
pub const ACTIVE_FORMAT_KEY: &str = "active_output_format";
/// Flat list of hex strings written by the oldest releases. Read once for
/// migration, never written.
pub const LEGACY_HISTORY_KEY: &str = "color_hex_code";
/// Whether the history panel is expanded.
pub const EXPANDED_KEY: &str = "isExpanded";

/// CRUD over the persisted history and preferences.
///
/// Every operation holds an in-process lock across its whole
/// read-modify-write cycle, so callers sharing one store never lose updates.
/// Writers in other processes still race with last-write-wins.
pub struct HistoryStore {
    storage: SharedKeyValueStore,
    config: StoreConfig,
    op_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(storage: SharedKeyValueStore) -> Self {
        Self {
            storage,
            config: StoreConfig::default(),
            op_lock: Mutex::new(()),
        }
    }

    pub fn with_config(storage: SharedKeyValueStore, config: StoreConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            storage,
            config,
            op_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Read the history, newest first.
    ///
    /// Stored records are repaired or dropped individually, never failing the
    /// read. When nothing usable is stored under the current key, the legacy
    /// hex list is migrated once: written under the current key and then
    /// deleted.
    pub async fn get_history(&self) -> CoreResult<Vec<HistoryEntry>> {
        let _guard = self.op_lock.lock().await;
        self.read_history().await
    }

    /// Prepend the entry, evicting the oldest beyond the cap.
    pub async fn add_entry(&self, entry: HistoryEntry) -> CoreResult<Vec<HistoryEntry>> {
        let _guard = self.op_lock.lock().await;
        let mut history = self.read_history().await?;
        history.insert(0, entry);
        history.truncate(self.config.max_entries);
        self.write_history(&history).await?;
        Ok(history)
    }

    /// Drop the entry with the given id. Unknown ids leave the history as is.
    pub async fn remove_entry(&self, id: &str) -> CoreResult<Vec<HistoryEntry>> {
        let _guard = self.op_lock.lock().await;
        let mut history = self.read_history().await?;
        history.retain(|entry| entry.id() != id);
        self.write_history(&history).await?;
        Ok(history)
    }

    /// Delete the current and the legacy history, so nothing is re-migrated.
    pub async fn clear_history(&self) -> CoreResult<()> {
        let _guard = self.op_lock.lock().await;
        self.remove(&[HISTORY_KEY, LEGACY_HISTORY_KEY]).await?;
        tracing::info!("color history cleared");
        Ok(())
    }

    /// Read the output format. An absent or unknown value is replaced by the
    /// default, which is also written back.
    pub async fn get_active_format(&self) -> CoreResult<FormatId> {
        let _guard = self.op_lock.lock().await;
        let record = self.get(&[ACTIVE_FORMAT_KEY]).await?;
        if let Some(format) = record.get(ACTIVE_FORMAT_KEY).and_then(FormatId::from_value) {
            return Ok(format);
        }

        let format = FormatId::default();
        if let Some(stale) = record.get(ACTIVE_FORMAT_KEY) {
            tracing::warn!("resetting unknown output format {stale} to {format}");
        }
        self.set(format_record(format)).await?;
        Ok(format)
    }

    pub async fn set_active_format(&self, format: FormatId) -> CoreResult<()> {
        let _guard = self.op_lock.lock().await;
        self.set(format_record(format)).await
    }

    /// Whether the history panel was left expanded. Defaults to collapsed.
    pub async fn get_expanded_state(&self) -> CoreResult<bool> {
        let _guard = self.op_lock.lock().await;
        let record = self.get(&[EXPANDED_KEY]).await?;
        Ok(record
            .get(EXPANDED_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    pub async fn set_expanded_state(&self, expanded: bool) -> CoreResult<()> {
        let _guard = self.op_lock.lock().await;
        let mut record = Record::new();
        record.insert(EXPANDED_KEY.to_string(), Value::Bool(expanded));
        self.set(record).await
    }

    async fn read_history(&self) -> CoreResult<Vec<HistoryEntry>> {
        let mut record = self
            .get(&[HISTORY_KEY, ACTIVE_FORMAT_KEY, LEGACY_HISTORY_KEY])
            .await?;
        let fallback = record
            .get(ACTIVE_FORMAT_KEY)
            .and_then(FormatId::from_value)
            .unwrap_or_default();

        let sanitized = sanitize_history(record.get(HISTORY_KEY), fallback);
        if sanitized.repaired > 0 || sanitized.dropped > 0 {
            tracing::warn!(
                "color history needed repair: {} repaired, {} dropped",
                sanitized.repaired,
                sanitized.dropped
            );
        }
        if !sanitized.entries.is_empty() {
            let mut entries = sanitized.entries;
            entries.truncate(self.config.max_entries);
            return Ok(entries);
        }

        let Some(legacy) = record.remove(LEGACY_HISTORY_KEY) else {
            return Ok(Vec::new());
        };
        let migrated = migrate_legacy(&legacy, fallback, self.config.max_entries);
        if !migrated.is_empty() {
            self.write_history(&migrated).await?;
        }
        self.remove(&[LEGACY_HISTORY_KEY]).await?;
        if migrated.is_empty() {
            tracing::warn!("discarded legacy color history with no usable colors: {legacy}");
        } else {
            tracing::info!("migrated {} legacy color history entries", migrated.len());
        }
        Ok(migrated)
    }

    async fn write_history(&self, history: &[HistoryEntry]) -> CoreResult<()> {
        let value = serde_json::to_value(history).map_err(|error| CoreError::Persistence {
            operation: "set",
            source: StorageError::Serialization(error),
        })?;
        let mut record = Record::new();
        record.insert(HISTORY_KEY.to_string(), value);
        self.set(record).await
    }

    async fn get(&self, keys: &[&str]) -> CoreResult<Record> {
        self.bounded("get", self.storage.get(keys)).await
    }

    async fn set(&self, record: Record) -> CoreResult<()> {
        self.bounded("set", self.storage.set(record)).await
    }

    async fn remove(&self, keys: &[&str]) -> CoreResult<()> {
        self.bounded("remove", self.storage.remove(keys)).await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StorageResult<T>>,
    ) -> CoreResult<T> {
        let timeout = self.config.io_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => {
                tracing::warn!("persistence {operation} failed: {source}");
                Err(CoreError::Persistence { operation, source })
            }
            Err(_) => {
                tracing::warn!("persistence {operation} timed out after {timeout:?}");
                Err(CoreError::PersistenceTimeout { operation, timeout })
            }
        }
    }
}

fn format_record(format: FormatId) -> Record {
    let mut record = Record::new();
    record.insert(
        ACTIVE_FORMAT_KEY.to_string(),
        Value::String(format.as_str().to_string()),
    );
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::entry::create_entry;
    use crate::storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn memory_store(initial: Value) -> (Arc<MemoryKeyValueStore>, HistoryStore) {
        let kv = Arc::new(MemoryKeyValueStore::with_record(record(initial)));
        let store = HistoryStore::new(kv.clone());
        (kv, store)
    }

    fn small_store(max_entries: usize) -> HistoryStore {
        let config = StoreConfig {
            max_entries,
            ..StoreConfig::default()
        };
        HistoryStore::with_config(Arc::new(MemoryKeyValueStore::new()), config).unwrap()
    }

    #[tokio::test]
    async fn empty_store_has_empty_history() {
        let (_, store) = memory_store(json!({}));
        assert!(store.get_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn added_entry_comes_first() {
        let (_, store) = memory_store(json!({}));
        store.add_entry(create_entry("#111111", FormatId::Hex)).await.unwrap();
        let newest = create_entry("#222222", FormatId::Rgb);
        let returned = store.add_entry(newest.clone()).await.unwrap();

        let history = store.get_history().await.unwrap();
        assert_eq!(history, returned);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], newest);
        assert_eq!(history[1].source_hex(), "#111111");
    }

    #[tokio::test]
    async fn oldest_entry_is_evicted_past_cap() {
        let store = small_store(3);
        let first = create_entry("#000001", FormatId::Hex);
        store.add_entry(first.clone()).await.unwrap();
        for hex in ["#000002", "#000003", "#000004"] {
            store.add_entry(create_entry(hex, FormatId::Hex)).await.unwrap();
        }

        let history = store.get_history().await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|entry| entry.id() != first.id()));
        assert_eq!(history[0].source_hex(), "#000004");
    }

    #[tokio::test]
    async fn removing_unknown_id_is_a_no_op() {
        let (_, store) = memory_store(json!({}));
        store.add_entry(create_entry("#abcdef", FormatId::Hex)).await.unwrap();

        let history = store.remove_entry("no-such-id").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(store.get_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn removes_entry_by_id() {
        let (_, store) = memory_store(json!({}));
        let keep = create_entry("#aaaaaa", FormatId::Hex);
        let removed = create_entry("#bbbbbb", FormatId::Hex);
        store.add_entry(keep.clone()).await.unwrap();
        store.add_entry(removed.clone()).await.unwrap();

        let history = store.remove_entry(removed.id()).await.unwrap();
        assert_eq!(history, vec![keep]);
    }

    #[tokio::test]
    async fn migrates_legacy_hex_list() {
        let (kv, store) = memory_store(json!({"color_hex_code": ["#ff0000", "#00ff00"]}));

        let history = store.get_history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].source_hex(), "#ff0000");
        assert_eq!(history[1].source_hex(), "#00ff00");
        assert!(history.iter().all(|e| e.format_at_pick() == FormatId::Hex));

        let raw = kv.snapshot();
        assert!(!raw.contains_key(LEGACY_HISTORY_KEY));
        assert_eq!(raw[HISTORY_KEY].as_array().unwrap().len(), 2);

        // A second read sees the migrated data, not a fresh migration.
        let again = store.get_history().await.unwrap();
        assert_eq!(again, history);
    }

    #[tokio::test]
    async fn migration_uses_stored_format() {
        let (_, store) = memory_store(json!({
            "color_hex_code": ["#0000ff"],
            "active_output_format": "oklch"
        }));
        let history = store.get_history().await.unwrap();
        assert_eq!(history[0].format_at_pick(), FormatId::Oklch);
        assert_eq!(history[0].value_at_pick(), history[0].values().oklch);
    }

    #[tokio::test]
    async fn current_history_wins_over_legacy() {
        let entry = create_entry("#123123", FormatId::Hex);
        let (kv, store) = memory_store(json!({
            "color_history": [serde_json::to_value(&entry).unwrap()],
            "color_hex_code": ["#ff0000"]
        }));

        assert_eq!(store.get_history().await.unwrap(), vec![entry]);
        assert!(kv.snapshot().contains_key(LEGACY_HISTORY_KEY));
    }

    #[tokio::test]
    async fn repairs_partial_record() {
        let (_, store) = memory_store(json!({"color_history": [{"sourceHex": "#123456"}]}));
        let history = store.get_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].values().hex, "#123456");
        assert_eq!(history[0].format_at_pick(), FormatId::Hex);
        assert!(!history[0].id().is_empty());
    }

    #[tokio::test]
    async fn unusable_history_falls_through_to_legacy() {
        let (_, store) = memory_store(json!({
            "color_history": [null, {"id": "nothing"}],
            "color_hex_code": ["#00ff00"]
        }));
        let history = store.get_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].source_hex(), "#00ff00");
    }

    #[tokio::test]
    async fn unusable_legacy_list_is_discarded() {
        let (kv, store) = memory_store(json!({"color_hex_code": ["oops", 7, null]}));
        assert!(store.get_history().await.unwrap().is_empty());

        let raw = kv.snapshot();
        assert!(!raw.contains_key(LEGACY_HISTORY_KEY));
        assert!(!raw.contains_key(HISTORY_KEY));
    }

    #[tokio::test]
    async fn removing_a_duplicated_id_keeps_the_copy() {
        let mut stored = serde_json::to_value(create_entry("#445566", FormatId::Hex)).unwrap();
        stored["id"] = json!("same");
        let (_, store) = memory_store(json!({"color_history": [stored, stored]}));

        let history = store.get_history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_ne!(history[0].id(), history[1].id());

        let remaining = store.remove_entry("same").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].source_hex(), "#445566");
    }

    #[tokio::test]
    async fn clear_does_not_resurrect_legacy() {
        let (kv, store) = memory_store(json!({"color_hex_code": ["#ff0000"]}));
        store.add_entry(create_entry("#00ff00", FormatId::Hex)).await.unwrap();

        store.clear_history().await.unwrap();
        assert!(store.get_history().await.unwrap().is_empty());

        let raw = kv.snapshot();
        assert!(!raw.contains_key(HISTORY_KEY));
        assert!(!raw.contains_key(LEGACY_HISTORY_KEY));
    }

    #[tokio::test]
    async fn active_format_self_heals() {
        let (kv, store) = memory_store(json!({}));
        assert_eq!(store.get_active_format().await.unwrap(), FormatId::Hex);
        assert_eq!(kv.snapshot()[ACTIVE_FORMAT_KEY], json!("hex"));

        let (kv, store) = memory_store(json!({"active_output_format": "cmyk"}));
        assert_eq!(store.get_active_format().await.unwrap(), FormatId::Hex);
        assert_eq!(kv.snapshot()[ACTIVE_FORMAT_KEY], json!("hex"));
    }

    #[tokio::test]
    async fn active_format_round_trips() {
        let (kv, store) = memory_store(json!({}));
        store.set_active_format(FormatId::P3).await.unwrap();
        assert_eq!(store.get_active_format().await.unwrap(), FormatId::P3);
        assert_eq!(kv.snapshot()[ACTIVE_FORMAT_KEY], json!("p3"));
    }

    #[tokio::test]
    async fn expanded_state_defaults_to_collapsed() {
        let (kv, store) = memory_store(json!({"isExpanded": "yes"}));
        assert!(!store.get_expanded_state().await.unwrap());

        store.set_expanded_state(true).await.unwrap();
        assert!(store.get_expanded_state().await.unwrap());
        assert_eq!(kv.snapshot()[EXPANDED_KEY], json!(true));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = StoreConfig {
            max_entries: 0,
            ..StoreConfig::default()
        };
        let result = HistoryStore::with_config(Arc::new(MemoryKeyValueStore::new()), config);
        assert!(matches!(result, Err(CoreError::InvalidConfig(_))));
    }

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, _keys: &[&str]) -> StorageResult<Record> {
            Ok(Record::new())
        }

        async fn set(&self, _record: Record) -> StorageResult<()> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        async fn remove(&self, _keys: &[&str]) -> StorageResult<()> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn failures_name_the_operation() {
        let store = HistoryStore::new(Arc::new(FailingStore));

        let err = store
            .add_entry(create_entry("#ffffff", FormatId::Hex))
            .await
            .expect_err("set fails");
        assert_eq!(err.operation(), Some("set"));
        assert!(matches!(err, CoreError::Persistence { .. }));

        let err = store.clear_history().await.expect_err("remove fails");
        assert_eq!(err.operation(), Some("remove"));
    }

    struct StalledStore;

    #[async_trait]
    impl KeyValueStore for StalledStore {
        async fn get(&self, _keys: &[&str]) -> StorageResult<Record> {
            std::future::pending().await
        }

        async fn set(&self, _record: Record) -> StorageResult<()> {
            std::future::pending().await
        }

        async fn remove(&self, _keys: &[&str]) -> StorageResult<()> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn stalled_backend_times_out() {
        let config = StoreConfig {
            io_timeout_ms: 20,
            ..StoreConfig::default()
        };
        let store = HistoryStore::with_config(Arc::new(StalledStore), config).unwrap();

        let err = store.get_history().await.expect_err("times out");
        match err {
            CoreError::PersistenceTimeout { operation, timeout } => {
                assert_eq!(operation, "get");
                assert_eq!(timeout.as_millis(), 20);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_are_not_lost() {
        let store = Arc::new(HistoryStore::new(Arc::new(MemoryKeyValueStore::new())));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let hex = format!("#0000{i:02x}");
                store.add_entry(create_entry(&hex, FormatId::Hex)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get_history().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn persists_to_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        let entry = create_entry("#c0ffee", FormatId::Lab);
        {
            let store = HistoryStore::new(Arc::new(FileKeyValueStore::new(path.clone())));
            store.add_entry(entry.clone()).await.unwrap();
            store.set_active_format(FormatId::Lch).await.unwrap();
        }

        let store = HistoryStore::new(Arc::new(FileKeyValueStore::new(path)));
        assert_eq!(store.get_history().await.unwrap(), vec![entry]);
        assert_eq!(store.get_active_format().await.unwrap(), FormatId::Lch);
    }
}
