//! Color history: entry construction, schema repair and the persisted store.

mod entry;
mod sanitize;
mod store;

pub use entry::{create_entry, HistoryEntry, DEFAULT_SOURCE_HEX};
pub use store::{
    HistoryStore, ACTIVE_FORMAT_KEY, EXPANDED_KEY, HISTORY_KEY, LEGACY_HISTORY_KEY,
};
