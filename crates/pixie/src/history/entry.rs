use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::{parse_color, snapshot_of, Color, ColorSpace, FormatId, FormatSnapshot};
use crate::utils::time::{is_iso8601, now_rfc3339};

/// Color recorded when a capture hands over something unparseable.
pub const DEFAULT_SOURCE_HEX: &str = "#000000";

/// One picked color, as persisted.
///
/// Entries are values: built once by [`create_entry`] (or by repairing an
/// older record) and never mutated afterwards. `value_at_pick` always equals
/// `values[format_at_pick]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    id: String,
    created_at: String,
    source_hex: String,
    format_at_pick: FormatId,
    value_at_pick: String,
    values: FormatSnapshot,
}

impl HistoryEntry {
    pub(crate) fn from_color(
        id: String,
        created_at: String,
        source_hex: String,
        color: &Color,
        format_at_pick: FormatId,
    ) -> Self {
        let values = snapshot_of(color);
        Self {
            id,
            created_at,
            source_hex,
            format_at_pick,
            value_at_pick: values.get(format_at_pick).to_string(),
            values,
        }
    }

    pub(crate) fn with_id(self, id: String) -> Self {
        Self { id, ..self }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// ISO-8601 creation timestamp.
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn source_hex(&self) -> &str {
        &self.source_hex
    }

    pub fn format_at_pick(&self) -> FormatId {
        self.format_at_pick
    }

    pub fn value_at_pick(&self) -> &str {
        &self.value_at_pick
    }

    pub fn values(&self) -> &FormatSnapshot {
        &self.values
    }

    /// Check the invariants serde cannot: a non-empty id, a real timestamp, a
    /// source color in canonical `#rrggbb` form, and a pick value matching the
    /// snapshot.
    pub(crate) fn is_consistent(&self) -> bool {
        !self.id.is_empty()
            && is_iso8601(&self.created_at)
            && parse_color(&self.source_hex).is_ok_and(|color| color.to_hex() == self.source_hex)
            && self.values.get(self.format_at_pick) == self.value_at_pick
    }
}

/// Build the history entry for a freshly captured color.
///
/// An unparseable `source_hex` records black instead, so a capture is never
/// lost. The entry gets a fresh id and the current time.
pub fn create_entry(source_hex: &str, format_at_pick: FormatId) -> HistoryEntry {
    let color = match parse_color(source_hex) {
        Ok(color) => color,
        Err(error) => {
            tracing::warn!("recording {DEFAULT_SOURCE_HEX} for captured color: {error}");
            Color::new(ColorSpace::Srgb, [0.0, 0.0, 0.0])
        }
    };

    HistoryEntry::from_color(
        Uuid::new_v4().to_string(),
        now_rfc3339(),
        color.to_hex(),
        &color,
        format_at_pick,
    )
}
