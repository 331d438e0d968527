pub mod color;
pub mod config;
pub mod error;
pub mod history;
pub mod storage;
pub mod utils;

pub use crate::color::{
    get_all_formats, is_light_color, map_to_displayable, normalize_hex, normalize_hue,
    parse_color, render_as, Color, Displayable, FormatId, FormatSnapshot,
};
pub use crate::config::{load_or_create_store_config, StoreConfig};
pub use crate::error::{CoreError, CoreResult, StorageError, StorageResult};
pub use crate::history::{create_entry, HistoryEntry, HistoryStore};
pub use crate::storage::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, SharedKeyValueStore,
};
