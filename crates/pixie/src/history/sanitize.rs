//! Schema-tolerant reading of persisted history.
//!
//! Persisted data may come from any earlier release. Each stored element is
//! classified as a current entry (kept verbatim), a repairable record (some
//! usable color plus whatever metadata survived), or unusable (dropped). A
//! single bad record never fails a read.

use std::collections::HashSet;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::entry::{create_entry, HistoryEntry};
use crate::color::{map_to_displayable, parse_color, Color, FormatId};
use crate::utils::time::{is_iso8601, unknown_rfc3339};

/// What survived of a record that does not match the current schema.
#[derive(Debug, Clone)]
pub(crate) struct PartialEntry {
    id: Option<String>,
    created_at: Option<String>,
    color: Color,
    format_at_pick: Option<FormatId>,
    /// Seed for a stable id when the record carries none.
    fingerprint: String,
}

#[derive(Debug, Clone)]
pub(crate) enum Classified {
    Current(HistoryEntry),
    Repairable(PartialEntry),
    Unusable,
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

/// Find a color in the record: the source hex, then the snapshot's hex, then
/// the pick value in whatever notation it was rendered.
fn usable_color(object: &Map<String, Value>) -> Option<Color> {
    non_empty_str(object, "sourceHex")
        .and_then(|hex| parse_color(hex).ok())
        .or_else(|| {
            object
                .get("values")
                .and_then(|values| values.get("hex"))
                .and_then(Value::as_str)
                .and_then(|hex| parse_color(hex).ok())
        })
        .or_else(|| non_empty_str(object, "valueAtPick").and_then(|raw| raw.parse().ok()))
}

pub(crate) fn classify(raw: &Value) -> Classified {
    if let Ok(entry) = serde_json::from_value::<HistoryEntry>(raw.clone()) {
        if entry.is_consistent() {
            return Classified::Current(entry);
        }
    }

    let fingerprint = raw.to_string();
    match raw {
        Value::String(hex) => match parse_color(hex) {
            Ok(color) => Classified::Repairable(PartialEntry {
                id: None,
                created_at: None,
                color,
                format_at_pick: None,
                fingerprint,
            }),
            Err(_) => Classified::Unusable,
        },
        Value::Object(object) => {
            let Some(color) = usable_color(object) else {
                return Classified::Unusable;
            };
            Classified::Repairable(PartialEntry {
                id: non_empty_str(object, "id").map(str::to_string),
                created_at: non_empty_str(object, "createdAt")
                    .filter(|value| is_iso8601(value))
                    .map(str::to_string),
                color,
                format_at_pick: object.get("formatAtPick").and_then(FormatId::from_value),
                fingerprint,
            })
        }
        _ => Classified::Unusable,
    }
}

impl PartialEntry {
    /// Rebuild a full entry. The color is mapped into sRGB if needed and all
    /// renderings are recomputed from its hex identity. Missing metadata gets
    /// deterministic defaults, so the same stored record repairs to the same
    /// entry on every read.
    pub(crate) fn repair(self, fallback_format: FormatId) -> Option<HistoryEntry> {
        let hex = map_to_displayable(&self.color).hex;
        let color = parse_color(&hex).ok()?;
        let id = self.id.unwrap_or_else(|| {
            Uuid::new_v5(&Uuid::NAMESPACE_OID, self.fingerprint.as_bytes()).to_string()
        });

        Some(HistoryEntry::from_color(
            id,
            self.created_at.unwrap_or_else(unknown_rfc3339),
            hex,
            &color,
            self.format_at_pick.unwrap_or(fallback_format),
        ))
    }
}

/// Outcome of sanitizing the stored history.
#[derive(Debug, Default)]
pub(crate) struct Sanitized {
    pub entries: Vec<HistoryEntry>,
    pub repaired: usize,
    pub dropped: usize,
}

/// Turn whatever is stored under the history key into current entries,
/// keeping their order. Anything but an array counts as empty.
pub(crate) fn sanitize_history(raw: Option<&Value>, fallback_format: FormatId) -> Sanitized {
    let Some(Value::Array(items)) = raw else {
        return Sanitized::default();
    };

    let mut sanitized = Sanitized::default();
    let mut seen = HashSet::new();

    for item in items {
        match classify(item) {
            Classified::Current(entry) => {
                let stored_id = entry.id().to_string();
                let entry = with_unique_id(entry, &mut seen);
                if entry.id() != stored_id {
                    sanitized.repaired += 1;
                }
                sanitized.entries.push(entry);
            }
            Classified::Repairable(partial) => match partial.repair(fallback_format) {
                Some(entry) => {
                    let entry = with_unique_id(entry, &mut seen);
                    sanitized.repaired += 1;
                    sanitized.entries.push(entry);
                }
                None => sanitized.dropped += 1,
            },
            Classified::Unusable => sanitized.dropped += 1,
        }
    }

    sanitized
}

/// Derive a fresh, still deterministic id when an entry collides with one
/// already read. The first entry with a given id keeps it.
fn with_unique_id(entry: HistoryEntry, seen: &mut HashSet<String>) -> HistoryEntry {
    if seen.insert(entry.id().to_string()) {
        return entry;
    }

    let mut attempt = 1usize;
    loop {
        let seed = format!("{}#{attempt}", entry.id());
        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string();
        if seen.insert(id.clone()) {
            return entry.with_id(id);
        }
        attempt += 1;
    }
}

/// Turn the oldest stored shape, a flat list of hex strings, into entries in
/// the original order. Strings that do not parse as hex are skipped rather
/// than recorded as black.
pub(crate) fn migrate_legacy(raw: &Value, format: FormatId, max_entries: usize) -> Vec<HistoryEntry> {
    let Value::Array(items) = raw else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_str)
        .filter(|hex| parse_color(hex).is_ok())
        .take(max_entries)
        .map(|hex| create_entry(hex, format))
        .collect()
}
