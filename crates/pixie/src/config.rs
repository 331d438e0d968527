use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

pub const STORE_CONFIG_FILENAME: &str = "pixie.json";
pub const DEFAULT_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 5_000;

/// Tuning for [`crate::HistoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Most entries the history keeps. Older entries are evicted first.
    pub max_entries: usize,
    /// Upper bound for a single persistence call.
    pub io_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.max_entries == 0 {
            return Err(CoreError::InvalidConfig(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.io_timeout_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "io_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn store_config_path(dir: &Path) -> PathBuf {
    dir.join(STORE_CONFIG_FILENAME)
}

/// Load the config from `dir`, writing the defaults there first when no
/// config file exists yet. Fields missing from the file take their defaults.
pub fn load_or_create_store_config(dir: &Path) -> CoreResult<StoreConfig> {
    std::fs::create_dir_all(dir).map_err(|error| {
        CoreError::InvalidConfig(format!(
            "failed to create config directory {}: {error}",
            dir.display()
        ))
    })?;

    let path = store_config_path(dir);
    if !path.exists() {
        let config = StoreConfig::default();
        write_store_config(&path, &config)?;
        return Ok(config);
    }

    let data = std::fs::read_to_string(&path).map_err(|error| {
        CoreError::InvalidConfig(format!(
            "failed to read config {}: {error}",
            path.display()
        ))
    })?;
    let config: StoreConfig = serde_json::from_str(&data).map_err(|error| {
        CoreError::InvalidConfig(format!(
            "failed to parse config {}: {error}",
            path.display()
        ))
    })?;
    config.validate()?;
    Ok(config)
}

fn write_store_config(path: &Path, config: &StoreConfig) -> CoreResult<()> {
    let data = serde_json::to_string_pretty(config).map_err(|error| {
        CoreError::InvalidConfig(format!(
            "failed to serialize config {}: {error}",
            path.display()
        ))
    })?;
    std::fs::write(path, data).map_err(|error| {
        CoreError::InvalidConfig(format!(
            "failed to write config {}: {error}",
            path.display()
        ))
    })?;
    Ok(())
}
